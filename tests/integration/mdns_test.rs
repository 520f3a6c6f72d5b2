// tests/integration/mdns_test.rs

//! Tests for the mDNS advertisement task.

use reginabox::config::MdnsConfig;
use reginabox::core::tasks::mdns::MdnsAdvertiser;
use tokio::sync::broadcast;
use tokio::time::{Duration, timeout};

#[test]
fn test_service_info_describes_the_mirror() {
    let advertiser = MdnsAdvertiser::new(&MdnsConfig::default(), 4873);
    let info = advertiser.service_info().unwrap();

    assert_eq!(info.get_type(), "_reginabox._tcp.local.");
    assert_eq!(info.get_fullname(), "reginabox._reginabox._tcp.local.");
    assert_eq!(info.get_hostname(), "reginabox.local.");
    assert_eq!(info.get_port(), 4873);
    assert_eq!(
        info.get_property_val_str("version"),
        Some(env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn test_service_info_uses_configured_names() {
    let config = MdnsConfig {
        enabled: true,
        service_type: "_npm-mirror._tcp.local.".to_string(),
        instance_name: "lab".to_string(),
    };
    let info = MdnsAdvertiser::new(&config, 8080).service_info().unwrap();
    assert_eq!(info.get_fullname(), "lab._npm-mirror._tcp.local.");
    assert_eq!(info.get_hostname(), "lab.local.");
    assert_eq!(info.get_port(), 8080);
}

#[tokio::test]
async fn test_advertiser_stops_on_shutdown() {
    // Without multicast the responder fails to start and the task returns
    // early; either way it must not outlive shutdown.
    let advertiser = MdnsAdvertiser::new(&MdnsConfig::default(), 0);
    let (tx, rx) = broadcast::channel(1);
    let handle = tokio::spawn(advertiser.run(rx));
    tokio::time::sleep(Duration::from_millis(100)).await;
    let _ = tx.send(());

    timeout(Duration::from_secs(10), handle)
        .await
        .expect("advertiser should stop after shutdown")
        .unwrap();
}
