use mips_sim::cpu::CPUPolicy;
use mips_sim::run_wrapper;
use std::env;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let mut args = env::args().skip(1);
    let image_file =
        args.next().ok_or("You should specify exactly one memory image file")?;

    let mut policy = CPUPolicy::default();

    for arg in args {
        match arg.as_str() {
            "-v" => policy.verbose = true,
            _ => return Err(format!("Unknown parameter: {}", arg).into()),
        }
    }

    let report = run_wrapper::run_file(&image_file, policy)?;
    print!("{}", report);

    Ok(())
}
