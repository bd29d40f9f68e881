use std::process::ExitCode;

fn main() -> ExitCode {
    jobs_chart::logging::init_tracing();

    match jobs_chart::app::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}
