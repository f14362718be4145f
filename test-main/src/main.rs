use dotenv::dotenv;
use log::{debug, info};
use pipad_gpio::GpioDriver;
use pipad_gpio::gamepad::GamePad;
use pipad_gpio::raw::RawGpioDriver;
use std::thread::sleep;
use std::time::Duration;
use sysinfo::System;

fn main() -> eyre::Result<()> {
    dotenv().ok();
    pretty_env_logger::init();

    const UNKNOWN_STR: &str = "???";

    info!(
        "Hello, {}!",
        System::name().as_deref().unwrap_or(UNKNOWN_STR)
    );
    info!(
        "System ver {} kernel ver {}",
        System::long_os_version().as_deref().unwrap_or(UNKNOWN_STR),
        System::kernel_version().as_deref().unwrap_or(UNKNOWN_STR),
    );
    info!(
        "Hostname {}",
        System::host_name().as_deref().unwrap_or(UNKNOWN_STR)
    );
    info!("Architecture {}", System::cpu_arch());

    // let gpio = RawGpioDriver::new_gpiomem()?;
    let gpio = RawGpioDriver::new_mem()?;

    let mut pad = GamePad::new();

    // 74HC165 on the breadboard - Q7 on 4, CP on 5, /PL on 6
    pad.configure_shift_register(gpio.get_pin(4)?, gpio.get_pin(5)?, gpio.get_pin(6)?)?;

    // Two discrete buttons instead:
    // pad.configure_pins(vec![gpio.get_pin(23)?, gpio.get_pin(24)?])?;

    let mut frame = 0u32;

    loop {
        pad.scan()?;

        if frame % 125 == 0 {
            let pressed = pad.take_pressed();
            if pressed != 0 {
                info!("Pressed mask: {:#010b}", pressed);
            } else {
                debug!("Nothing pressed.");
            }
        }

        sleep(Duration::from_millis(8));

        frame += 1;
    }
}
