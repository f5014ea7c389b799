use buddy_core::Config;

pub async fn run() -> anyhow::Result<()> {
    let config_path = Config::default_path();
    let config = Config::load_or_default();

    println!("buddy status");
    println!("============");
    println!();

    match &config_path {
        Some(path) => println!(
            "Config:   {} {}",
            path.display(),
            if path.exists() { "✓" } else { "✗ (using defaults)" }
        ),
        None => println!("Config:   (no home directory, using defaults)"),
    }
    println!("Agent:    {}", config.agent.name);
    println!();

    println!("Providers:");
    let weather = config.providers.weather.resolved_api_key().is_some();
    let email = config.providers.email.resolved_credentials().is_some();
    let social = config.providers.social.resolved_token().is_some();

    println!(
        "  Weather:  {}",
        if weather { "✓ configured" } else { "✗ synthetic fallback (set WEATHER_API_KEY)" }
    );
    println!("  Calendar: ✓ in-memory store");
    println!(
        "  Email:    {}",
        if email { "✓ configured" } else { "✗ preview only (set GMAIL_EMAIL / GMAIL_APP_PASSWORD)" }
    );
    println!(
        "  Social:   {}",
        if social { "✓ configured" } else { "✗ simulated (set X_BEARER_TOKEN)" }
    );

    Ok(())
}
