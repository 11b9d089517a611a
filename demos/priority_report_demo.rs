use std::error::Error;

#[path = "common/synthetic_population.rs"]
mod synthetic_population;

fn main() -> Result<(), Box<dyn Error>> {
    hcp_priority::example_apps::run_priority_report(
        std::env::args().skip(1),
        synthetic_population::build_population,
    )
}
