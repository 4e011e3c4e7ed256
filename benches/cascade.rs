use criterion::{black_box, criterion_group, criterion_main, Criterion};

use rtm_pim::mem::config::Config;
use rtm_pim::mem::controller::{build_controller, MemoryController};
use rtm_pim::mem::request::{MemAddr, OpKind, RequestBuilder};
use rtm_pim::mem::SimulationContext;

/// one controller cycle with a full transaction queue, the scheduling hot
/// path of the simulator
pub fn cascade_cycle(c: &mut Criterion) {
    c.bench_function("cascade full queue", |b| {
        let config = Config::ddr4_rtm();
        let mut controller = build_controller(0, &config);
        let mut context = SimulationContext::new();
        let mut builder = RequestBuilder::new();
        let mut cycle = 0u64;
        for i in 0..config.queue_size as u64 {
            let addr = MemAddr {
                bank: (i % config.banks as u64) as usize,
                row: i * 17 % config.rows,
                ..Default::default()
            };
            controller
                .issue_command(builder.gen_request(OpKind::Read, addr), 0)
                .unwrap();
        }
        b.iter(|| {
            controller.cycle(&mut context, black_box(cycle));
            // keep the queue loaded so every iteration runs the full cascade
            for request in controller.take_finished() {
                let _ = controller.issue_command(
                    builder.gen_request(request.op, request.addr),
                    cycle,
                );
            }
            cycle += 1;
        });
    });
}

criterion_group!(benches, cascade_cycle);
criterion_main!(benches);
