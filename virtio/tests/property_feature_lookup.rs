//! Property: identifier lookups
//!
//! Device-specific feature names shadow common ones, unknown codes resolve to
//! nothing, and every registered device type resolves to its name.

use amp_virtio::ids::{device_id, CommonFeatures, COMMON_FEATURE_DESC};
use amp_virtio::{dev_name, feature_name, FeatureDesc, FeatureNameResolver};
use proptest::prelude::*;

const REGISTERED: &[(u16, &str)] = &[
    (device_id::NETWORK, "Network"),
    (device_id::BLOCK, "Block"),
    (device_id::CONSOLE, "Console"),
    (device_id::ENTROPY, "Entropy"),
    (device_id::BALLOON, "Balloon"),
    (device_id::IOMEMORY, "IOMemory"),
    (device_id::SCSI, "SCSI"),
    (device_id::NINE_P, "9P Transport"),
    (device_id::MAC80211_WLAN, "MAC80211 WLAN"),
    (device_id::RPROC_SERIAL, "Remoteproc Serial"),
    (device_id::GPU, "GPU"),
    (device_id::INPUT, "Input"),
    (device_id::VSOCK, "Vsock Transport"),
    (device_id::SOUND, "Sound"),
    (device_id::FS, "File System"),
    (device_id::MAC80211_HWSIM, "MAC80211 HWSIM"),
    (device_id::I2C_ADAPTER, "I2C Adapter"),
    (device_id::BT, "Bluetooth"),
    (device_id::GPIO, "GPIO"),
];

static DEVICE_FEATURES: &[FeatureDesc] = &[
    FeatureDesc::new(1 << 0, "Csum"),
    FeatureDesc::new(1 << 5, "Mac"),
    FeatureDesc::new(1 << 29, "DeviceEventIdx"),
];

/// Entries after the zero terminator are never consulted.
static TERMINATED_FEATURES: &[FeatureDesc] = &[
    FeatureDesc::new(1 << 3, "Mtu"),
    FeatureDesc::new(0, "End"),
    FeatureDesc::new(1 << 24, "PastEnd"),
    FeatureDesc::new(1 << 40, "AlsoPastEnd"),
];

/// Entries up to, not including, the first zero value.
fn live_entries(table: &[FeatureDesc]) -> impl Iterator<Item = &FeatureDesc> {
    table.iter().take_while(|f| f.value != 0)
}

fn arb_device_table() -> impl Strategy<Value = Option<&'static [FeatureDesc]>> {
    prop_oneof![
        Just(None),
        Just(Some(DEVICE_FEATURES)),
        Just(Some(TERMINATED_FEATURES)),
    ]
}

#[test]
fn registered_device_names() {
    for &(code, name) in REGISTERED {
        assert_eq!(dev_name(code), Some(name), "device id {}", code);
    }
}

#[test]
fn common_features_resolve_without_device_table() {
    assert_eq!(feature_name(CommonFeatures::NOTIFY_ON_EMPTY.bits(), None), Some("NotifyOnEmpty"));
    assert_eq!(feature_name(CommonFeatures::BAD_FEATURE.bits(), None), Some("BadFeature"));
    // ANY_LAYOUT has a flag but no name.
    assert_eq!(feature_name(CommonFeatures::ANY_LAYOUT.bits(), None), None);
}

#[test]
fn device_table_shadows_common_table() {
    assert_eq!(
        feature_name(CommonFeatures::RING_EVENT_IDX.bits(), Some(DEVICE_FEATURES)),
        Some("DeviceEventIdx")
    );
    assert_eq!(
        feature_name(CommonFeatures::RING_EVENT_IDX.bits(), None),
        Some("EventIdx")
    );
}

#[test]
#[allow(deprecated)]
fn describe_is_inert() {
    use std::sync::Arc;

    use amp_virtio::{describe, VirtioDevice, VirtioDeviceId, VirtioRole, Virtqueue};

    let vdev = VirtioDevice::new(VirtioRole::Driver, VirtioDeviceId::default(), Arc::new(|_: &Virtqueue| {}));
    let before = format!("{:?}", vdev);

    describe(&vdev, "features", 0xFFFF_FFFF, Some(DEVICE_FEATURES));
    describe(&vdev, "", 0, None);

    assert_eq!(format!("{:?}", vdev), before);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Codes outside the registered set never resolve.
    #[test]
    fn unregistered_device_codes_are_absent(code in any::<u16>()) {
        let expected = REGISTERED.iter().find(|(c, _)| *c == code).map(|(_, n)| *n);
        prop_assert_eq!(dev_name(code), expected);
    }

    /// Lookup equals "first table that knows the value".
    #[test]
    fn feature_lookup_prefers_device_table(bit in 0u32..64, device in arb_device_table()) {
        let value = 1u64 << bit;

        let from_device = device
            .and_then(|d| live_entries(d).find(|f| f.value == value))
            .map(|f| f.name);
        let from_common = live_entries(COMMON_FEATURE_DESC)
            .find(|f| f.value == value)
            .map(|f| f.name);

        let resolved = feature_name(value, device);
        prop_assert_eq!(resolved, from_device.or(from_common));
        prop_assert!(resolved != Some("PastEnd") && resolved != Some("AlsoPastEnd"));
    }

    /// The resolver honours source order for any pair of overlapping tables.
    #[test]
    fn resolver_first_source_wins(bit in 0u32..64) {
        let value = 1u64 << bit;
        let high = [FeatureDesc::new(value, "high")];
        let low = [FeatureDesc::new(value, "low")];

        let mut resolver = FeatureNameResolver::new();
        resolver.push_source(&high);
        resolver.push_source(&low);
        prop_assert_eq!(resolver.resolve(value), Some("high"));
        prop_assert_eq!(resolver.resolve(0), None);
    }
}
