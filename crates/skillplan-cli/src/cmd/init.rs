use skillplan_core::store::Store;
use std::path::Path;

pub fn run(root: &Path) -> anyhow::Result<()> {
    Store::init(root)?;
    println!("Initialized plan store in {}", root.join(".skillplan").display());
    Ok(())
}
