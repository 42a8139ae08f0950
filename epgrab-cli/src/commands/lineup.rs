//! Lineup detection test command.
//!
//! Validates a postal/ZIP code, generates the OTA lineup ids it implies, and
//! prints the listing-site and grid API URLs for verifying the lineup before
//! committing it to the configuration.

use clap::Args;
use epgrab::geocode::{LocationResolver, NoopGeocoder};
use epgrab::lineup::{
    auto_lineup_config, current_block_timestamp, format_postal_for_display, grid_api_url, Country,
    LocationStatus,
};

use crate::error::CliError;

/// Arguments for the lineup command.
#[derive(Debug, Args)]
pub struct LineupArgs {
    /// Postal/ZIP code to test (e.g., 90210 or "J3B 1M4")
    pub postal: String,

    /// Show detailed debug information and recommended configuration
    #[arg(long)]
    pub debug: bool,
}

/// Run the lineup detection test.
pub fn run(args: LineupArgs) -> Result<(), CliError> {
    let Some((country, clean_postal)) = epgrab::config::validate_postal_code(&args.postal) else {
        return Err(CliError::InvalidPostal(args.postal));
    };

    let mut resolver = LocationResolver::new(Box::new(NoopGeocoder), args.debug);
    let config = auto_lineup_config(&mut resolver, &clean_postal, country);

    if args.debug {
        println!("{}", "=".repeat(70));
        println!("EPGRAB - LINEUP DETECTION (DEBUG MODE)");
        println!("{}", "=".repeat(70));
        println!("LOCATION INFORMATION:");
        println!("   Normalized code:   {}", clean_postal);
        println!(
            "   Detected country:  {} ({})",
            country.full_name(),
            country.as_str()
        );
        println!();
    }

    println!("GRACENOTE API URL PARAMETERS:");
    println!("   lineupId={}", config.api_lineup_id);
    println!("   country={}", country.as_str());
    println!("   postalCode={}", clean_postal);
    println!();

    println!("VALIDATION URLs:");
    match config.location_status {
        LocationStatus::AutoResolved => {
            println!("   Direct URL: {}", config.tvtv_url);
            println!(
                "   Status: Location automatically resolved ({}, {})",
                config.resolved_city.as_deref().unwrap_or("?"),
                config.resolved_province.as_deref().unwrap_or("?")
            );
        }
        LocationStatus::UnableToResolve => {
            println!(
                "   Status: Unable to automatically resolve location for {}",
                clean_postal
            );
            println!("   Manual lookup required:");
        }
    }
    print_manual_instructions(&clean_postal, country, &config.tvtv_lineup_id);
    println!();

    if args.debug {
        println!(
            "   Note: OTA format is {} (country + OTA + postal, no -DEFAULT suffix)",
            config.tvtv_lineup_id
        );
        println!(
            "   Cable/Satellite providers use different format: {}-[ProviderID]-X",
            country.as_str()
        );
        println!();
    }

    println!("GRACENOTE API URL FOR TESTING:");
    let timestamp = current_block_timestamp();
    if args.debug {
        println!("   Using current 3-hour block (timestamp: {})", timestamp);
    }
    println!("   {}", grid_api_url(&config, Some(timestamp)));
    println!();

    if args.debug {
        print_recommended_configuration(&clean_postal, country, &config.tvtv_lineup_id);
    }

    Ok(())
}

fn print_manual_instructions(clean_postal: &str, country: Country, tvtv_lineup_id: &str) {
    let code_label = match country {
        Country::Can => "postal code",
        Country::Usa => "ZIP code",
    };
    println!("     1. Go to {}", country.listing_site());
    println!(
        "     2. Enter {}: {}",
        code_label,
        format_postal_for_display(clean_postal, country)
    );
    println!(
        "     3a. For OTA: Click 'Broadcast' then 'Local Over the Air', look for 'lu{}' in the URL",
        tvtv_lineup_id
    );
    println!(
        "     3b. For Cable/Sat: Select your provider, look for 'lu{}-[ProviderID]-X' in the URL",
        country.as_str()
    );
    println!("     4. Expected OTA pattern: lu{}", tvtv_lineup_id);
}

fn print_recommended_configuration(clean_postal: &str, country: Country, tvtv_lineup_id: &str) {
    println!("RECOMMENDED CONFIGURATION:");
    println!("   <!-- Simplified configuration (auto-detection) -->");
    println!("   <setting id=\"zipcode\">{}</setting>", clean_postal);
    println!("   <setting id=\"lineupid\">auto</setting>");
    println!();
    println!("   <!-- Alternative: Copy listing-site lineup ID directly -->");
    println!(
        "   <!-- <setting id=\"lineupid\">{}</setting> -->",
        tvtv_lineup_id
    );
    println!();
    println!("   <!-- For Cable/Satellite providers: -->");
    println!(
        "   <!-- <setting id=\"lineupid\">{}-[ProviderID]-X</setting> -->",
        country.as_str()
    );
    println!();
    println!("{}", "=".repeat(70));
    println!("NEXT STEPS:");
    println!("1. Verify the validation URLs show your local channels");
    println!("2. Update your configuration file with the recommended settings");
    println!("3. Run: epgrab load --console");
    println!("4. Look for 'Auto-detected lineupID' in the logs");
    println!("{}", "=".repeat(70));
}
