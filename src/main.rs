use mimalloc::MiMalloc;
use std::path::PathBuf;
use std::process::ExitCode;

mod scenario;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn main() -> ExitCode {
    let Some(path) = std::env::args_os().nth(1).map(PathBuf::from) else {
        eprintln!("usage: scoped-elements <scenario.toml>");
        return ExitCode::from(2);
    };
    match scenario::run_file(&path) {
        Ok(report) => {
            for line in report {
                println!("{line}");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
