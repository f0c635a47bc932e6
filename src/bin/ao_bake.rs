use std::error::Error;

use geo_ao::cli::bake::run_ao_bake_cli;

fn main() -> Result<(), Box<dyn Error>> {
    run_ao_bake_cli()
}
