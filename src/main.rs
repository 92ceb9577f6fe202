//! rAttendance main entrypoint.

use rattendance::run;
use rattendance::ui::messages::describe_failure;

fn main() {
    println!();
    if let Err(e) = run() {
        eprintln!("Error: {}", describe_failure(&e));
        std::process::exit(1);
    }
}
