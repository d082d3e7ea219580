use std::process::ExitCode;

fn main() -> ExitCode {
    uartline::boot::init_logging();

    match uartline::cli::actions::run(std::env::args_os()) {
        Ok(code) => code,
        Err(err) => {
            log::error!("{err:?}");
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
