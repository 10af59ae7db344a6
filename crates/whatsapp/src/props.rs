//! Companion device properties sent to WhatsApp when pairing.

use mxwa_config::MxwaConfig;

/// WhatsApp's companion platform types, named as in the protocol enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformType {
    Unknown,
    Chrome,
    Firefox,
    Ie,
    Opera,
    Safari,
    Edge,
    Desktop,
    Ipad,
    AndroidTablet,
    Ohana,
    Aloha,
    Catalina,
    TclTv,
    IosPhone,
    IosCatalyst,
    AndroidPhone,
    AndroidAmbiguous,
    WearOs,
    ArWrist,
    ArDevice,
    Uwp,
    Vr,
}

const PLATFORM_NAMES: &[(&str, PlatformType)] = &[
    ("UNKNOWN", PlatformType::Unknown),
    ("CHROME", PlatformType::Chrome),
    ("FIREFOX", PlatformType::Firefox),
    ("IE", PlatformType::Ie),
    ("OPERA", PlatformType::Opera),
    ("SAFARI", PlatformType::Safari),
    ("EDGE", PlatformType::Edge),
    ("DESKTOP", PlatformType::Desktop),
    ("IPAD", PlatformType::Ipad),
    ("ANDROID_TABLET", PlatformType::AndroidTablet),
    ("OHANA", PlatformType::Ohana),
    ("ALOHA", PlatformType::Aloha),
    ("CATALINA", PlatformType::Catalina),
    ("TCL_TV", PlatformType::TclTv),
    ("IOS_PHONE", PlatformType::IosPhone),
    ("IOS_CATALYST", PlatformType::IosCatalyst),
    ("ANDROID_PHONE", PlatformType::AndroidPhone),
    ("ANDROID_AMBIGUOUS", PlatformType::AndroidAmbiguous),
    ("WEAR_OS", PlatformType::WearOs),
    ("AR_WRIST", PlatformType::ArWrist),
    ("AR_DEVICE", PlatformType::ArDevice),
    ("UWP", PlatformType::Uwp),
    ("VR", PlatformType::Vr),
];

impl PlatformType {
    /// Look up a platform by its protocol enum name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.to_uppercase();
        PLATFORM_NAMES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, p)| *p)
    }

    /// The protocol enum name, e.g. `ANDROID_PHONE`.
    pub fn proto_name(self) -> &'static str {
        PLATFORM_NAMES
            .iter()
            .find(|(_, p)| *p == self)
            .map_or("UNKNOWN", |(n, _)| n)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistorySyncLimits {
    pub full_sync_days_limit: u32,
    pub full_sync_size_mb_limit: u32,
    pub storage_quota_mb: u32,
}

/// Device properties handed to every protocol client at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceProps {
    pub os: String,
    pub require_full_sync: bool,
    pub history_sync_config: Option<HistorySyncLimits>,
    pub platform_type: Option<PlatformType>,
}

impl DeviceProps {
    pub fn from_config(config: &MxwaConfig) -> Self {
        let history = &config.bridge.history_sync;
        let fsc = history.full_sync_config;
        Self {
            os: config.whatsapp.os_name.clone(),
            require_full_sync: history.request_full_sync,
            history_sync_config: fsc.is_complete().then_some(HistorySyncLimits {
                full_sync_days_limit: fsc.days_limit,
                full_sync_size_mb_limit: fsc.size_limit,
                storage_quota_mb: fsc.storage_quota,
            }),
            platform_type: PlatformType::from_name(&config.whatsapp.browser_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, mxwa_config::FullSyncConfig, rstest::rstest};

    #[test]
    fn builds_props_from_config() {
        let mut config = MxwaConfig::default();
        config.whatsapp.os_name = "Bridge OS".into();
        config.whatsapp.browser_name = "safari".into();
        config.bridge.history_sync.request_full_sync = true;
        config.bridge.history_sync.full_sync_config = FullSyncConfig {
            days_limit: 365,
            size_limit: 512,
            storage_quota: 10240,
        };

        let props = DeviceProps::from_config(&config);
        assert_eq!(props.os, "Bridge OS");
        assert!(props.require_full_sync);
        assert_eq!(props.platform_type, Some(PlatformType::Safari));
        assert_eq!(
            props.history_sync_config,
            Some(HistorySyncLimits {
                full_sync_days_limit: 365,
                full_sync_size_mb_limit: 512,
                storage_quota_mb: 10240,
            })
        );
    }

    #[test]
    fn partial_limits_and_unknown_browser_are_omitted() {
        let mut config = MxwaConfig::default();
        config.whatsapp.browser_name = "netscape".into();
        config.bridge.history_sync.full_sync_config.days_limit = 30;

        let props = DeviceProps::from_config(&config);
        assert!(props.history_sync_config.is_none());
        assert!(props.platform_type.is_none());
    }

    #[rstest]
    #[case("chrome", PlatformType::Chrome)]
    #[case("Firefox", PlatformType::Firefox)]
    #[case("DESKTOP", PlatformType::Desktop)]
    #[case("android_phone", PlatformType::AndroidPhone)]
    fn browser_names_map_case_insensitively(#[case] name: &str, #[case] expected: PlatformType) {
        assert_eq!(PlatformType::from_name(name), Some(expected));
        assert_eq!(PlatformType::from_name(expected.proto_name()), Some(expected));
    }

    #[test]
    fn default_browser_name_maps_to_unknown_platform() {
        let props = DeviceProps::from_config(&MxwaConfig::default());
        assert_eq!(props.platform_type, Some(PlatformType::Unknown));
    }
}
