use beacon::indicators::BlinkConfig;
use beacon::io::OutputRef;
use beacon::mocks::MockDriver;
use beacon::scheduler::Scheduler;
use beacon::utils::tokio;

#[beacon::runtime]
async fn main() {
    let driver = MockDriver::default();
    let scheduler = Scheduler::new(driver.clone());
    scheduler.run().unwrap();

    // A LED wired to VCC on pin 8 (lit when the pin is LOW): 50ms on, 950ms off, forever.
    let led = scheduler
        .register(OutputRef::active_low(8), BlinkConfig::default())
        .unwrap();
    scheduler.configure_and_start(led, 50, 950, 0).unwrap();

    println!("Blinking {} - press Ctrl+C to stop.", scheduler.indicator(led).unwrap());
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = async {
            loop {
                beacon::pause!(250);
                println!("pin 8: {:?}", driver.get_level(8));
            }
        } => {}
    }

    // Turns the LED off and releases the pin.
    scheduler.shutdown().await.unwrap();
}
