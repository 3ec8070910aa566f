use anyhow::Result;
use meshcast::cast::Cast;
use meshcast::settings;

fn main() -> Result<()> {
    let settings = settings::load_config()?;
    let mut cast = Cast::new(settings)?;

    cast.solve()?;
    cast.writeup()?;

    Ok(())
}
