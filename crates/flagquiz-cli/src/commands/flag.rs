use flagquiz_core::Config;

pub fn run(code: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let catalog = config
        .flag_catalog()
        .ok_or("no flag directory configured; run `flagquiz config set assets_dir <DIR>`")?;

    match catalog.flag_image(code) {
        Some(path) => println!("{}", path.display()),
        None => println!("no image for {}", code.trim().to_uppercase()),
    }
    Ok(())
}
