use beacon::indicators::BlinkConfig;
use beacon::io::OutputRef;
use beacon::mocks::MockDriver;
use beacon::pause;
use beacon::scheduler::Scheduler;

#[beacon::runtime]
async fn main() {
    let driver = MockDriver::default();
    let scheduler = Scheduler::new(driver.clone());
    scheduler.run().unwrap();

    // Heartbeat: short flash every second, forever.
    let heartbeat = scheduler
        .register(OutputRef::active_high(13), BlinkConfig::new(50, 950, 0))
        .unwrap();
    // Warning: 5 fast blinks.
    let warning = scheduler
        .register(OutputRef::active_high(12), BlinkConfig::new(100, 100, 5))
        .unwrap();
    // Power: steady on.
    let power = scheduler
        .register(OutputRef::active_low(8), BlinkConfig::always_on())
        .unwrap();

    for handle in [heartbeat, warning, power] {
        scheduler.start(handle).unwrap();
    }

    pause!(1500);
    for handle in scheduler.handles() {
        println!("{}", scheduler.indicator(handle).unwrap());
    }

    // Switch the power indicator to a slow blink, and stop the heartbeat.
    scheduler.configure_and_start(power, 500, 500, 0).unwrap();
    scheduler.stop(heartbeat).unwrap();
    pause!(2000);

    for pin in [13, 12, 8] {
        println!("pin {}: {} writes", pin, driver.get_history(pin).len());
    }
    scheduler.shutdown().await.unwrap();
}
