//! Device and shell presets for the adaptive preview

/// Screen size of a previewed device
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DevicePreset {
    #[default]
    SmallPhone,
    LargePhone,
    Tablet,
    /// Any other size
    Custom,
}

impl DevicePreset {
    pub const ALL: [DevicePreset; 4] = [
        DevicePreset::SmallPhone,
        DevicePreset::LargePhone,
        DevicePreset::Tablet,
        DevicePreset::Custom,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DevicePreset::SmallPhone => "Small Phone",
            DevicePreset::LargePhone => "Large Phone",
            DevicePreset::Tablet => "Tablet",
            DevicePreset::Custom => "Custom",
        }
    }

    /// Portrait screen size in logical pixels, `None` for `Custom`
    pub fn size(self) -> Option<(i32, i32)> {
        match self {
            DevicePreset::SmallPhone => Some((360, 720)),
            DevicePreset::LargePhone => Some((360, 760)),
            DevicePreset::Tablet => Some((1280, 800)),
            DevicePreset::Custom => None,
        }
    }

    /// The preset with exactly this size, or `Custom`
    pub fn matching(width: i32, height: i32) -> Self {
        Self::ALL
            .into_iter()
            .find(|preset| preset.size() == Some((width, height)))
            .unwrap_or(DevicePreset::Custom)
    }
}

/// Top and bottom bars drawn by a previewed shell
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ShellPreset {
    Desktop,
    #[default]
    Mobile,
    Phosh,
    /// Any other bar heights
    Custom,
}

impl ShellPreset {
    pub const ALL: [ShellPreset; 4] = [
        ShellPreset::Desktop,
        ShellPreset::Mobile,
        ShellPreset::Phosh,
        ShellPreset::Custom,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ShellPreset::Desktop => "Desktop Shell",
            ShellPreset::Mobile => "Mobile Shell",
            ShellPreset::Phosh => "Phosh",
            ShellPreset::Custom => "Custom",
        }
    }

    /// Top and bottom bar heights, `None` for `Custom`
    pub fn bars(self) -> Option<(i32, i32)> {
        match self {
            ShellPreset::Desktop => Some((32, 0)),
            ShellPreset::Mobile => Some((26, 18)),
            ShellPreset::Phosh => Some((32, 15)),
            ShellPreset::Custom => None,
        }
    }

    /// The preset with exactly these bars, or `Custom`
    pub fn matching(top_bar: i32, bottom_bar: i32) -> Self {
        Self::ALL
            .into_iter()
            .find(|preset| preset.bars() == Some((top_bar, bottom_bar)))
            .unwrap_or(ShellPreset::Custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_presets() {
        assert_eq!(DevicePreset::matching(1280, 800), DevicePreset::Tablet);
        assert_eq!(DevicePreset::matching(800, 1280), DevicePreset::Custom);
        assert_eq!(ShellPreset::matching(32, 15), ShellPreset::Phosh);
        assert_eq!(ShellPreset::matching(0, 0), ShellPreset::Custom);
    }

    #[test]
    fn test_custom_has_no_values() {
        assert!(DevicePreset::Custom.size().is_none());
        assert!(ShellPreset::Custom.bars().is_none());
    }
}
