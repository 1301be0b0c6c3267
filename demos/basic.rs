//! Basic example: resolve a visitor's locale and throttle form submissions.
//!
//! Run with `RUST_LOG=debug` to see admissions and locale resolution.

use eunpa_salon::{
    catalog, client_identifier, local_today, AcceptLanguage, Endpoint, FilePreferenceStore, Locale,
    MemoryPreferenceStore, PreferenceResolver, RequestThrottle, ReservationRequest,
};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    println!("=== Locale Resolution ===\n");

    // Persist to the platform config directory when there is one
    let resolved = match FilePreferenceStore::open_default() {
        Some(store) => {
            println!("Preferences file: {}", store.path().display());
            PreferenceResolver::new(store, AcceptLanguage::new("ja-JP,ja;q=0.9,en;q=0.8"))
                .resolve()
        }
        None => PreferenceResolver::new(
            MemoryPreferenceStore::new(),
            AcceptLanguage::new("ja-JP,ja;q=0.9,en;q=0.8"),
        )
        .resolve(),
    };
    println!("Resolved locale: {}\n", resolved);

    for locale in Locale::ALL {
        let t = catalog::translations(locale);
        println!(
            "{} {:<8} {} / {}",
            locale.flag(),
            locale.native_name(),
            t.salon_name,
            t.header.book_now
        );
    }

    println!("\n=== Email Relay Throttling (5 per minute) ===\n");

    let today = local_today();
    let throttle = RequestThrottle::new();
    let client = client_identifier(Some("203.0.113.7, 10.0.0.1"), None);
    let request = ReservationRequest {
        name: "Jane Doe".to_string(),
        email: Some("jane@example.com".to_string()),
        phone: "010-1234-5678".to_string(),
        date: today.format("%Y-%m-%d").to_string(),
        time: "14:00".to_string(),
        service: Some("Cut".to_string()),
        message: None,
    };

    for attempt in 1..=7 {
        match throttle.submit(Endpoint::EmailRelay, &client, &request, today) {
            Ok(reservation) => println!(
                "attempt {}: accepted ({} at {} {})",
                attempt, reservation.name, reservation.date, reservation.time
            ),
            Err(e) => println!("attempt {}: {} ({})", attempt, e.status_code(), e),
        }
    }

    let snapshot = throttle.metrics().snapshot();
    println!(
        "\nadmitted: {}, rejected: {}",
        snapshot.requests_admitted, snapshot.requests_rejected
    );
}
