use gameloop::Clock;
use std::time::{Duration, Instant};

#[test]
#[ignore]
fn run_loop() {
    let mut clock = Clock::new(20);
    clock.start();

    for f in 0..10 {
        println!("--- start frame {}", f);
        std::thread::sleep(Duration::from_millis(153));

        for (i, action) in clock.begin_frame(Instant::now()).enumerate() {
            println!("{}): {:?}", i, action);
        }
    }
}
