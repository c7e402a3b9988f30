//! Where each emulator's builds come from

use crate::{GhAsset, RemoteArchive};
use emuhub_config::{DolphinChannel, EmulatorId, Settings, XeniaChannel, YuzuChannel};

/// Repository publishing the Switch system archives (firmware + keys)
pub const FIRMWARE_KEYS_REPO: (&str, &str) = ("emu-resources", "switch-system-archives");

/// EmuHub's own repository, used for the startup update notice
pub const EMUHUB_REPO: (&str, &str) = ("emuhub", "emuhub");

/// How to choose a release from a repository
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseStrategy {
    /// The `releases/latest` endpoint (excludes prereleases)
    Latest,
    /// The newest release of any kind (development channels)
    Newest,
}

/// Substring/suffix filter over release asset names
#[derive(Debug, Clone, Copy)]
pub struct AssetFilter {
    pub contains: &'static [&'static str],
    pub suffix: &'static str,
}

impl AssetFilter {
    /// First asset matching every substring and the suffix
    pub fn pick<'a>(&self, assets: &'a [GhAsset]) -> Option<&'a GhAsset> {
        assets.iter().find(|asset| {
            self.contains.iter().all(|needle| asset.name.contains(needle))
                && asset.name.ends_with(self.suffix)
        })
    }

    pub fn describe(&self) -> String {
        format!("{}*{}", self.contains.join("*"), self.suffix)
    }
}

/// A repository plus selection rules for one emulator channel
#[derive(Debug, Clone, Copy)]
pub struct ReleaseSource {
    pub owner: &'static str,
    pub repo: &'static str,
    pub strategy: ReleaseStrategy,
    pub asset: AssetFilter,
}

/// The newest build of an emulator, ready to download
#[derive(Debug, Clone)]
pub struct EmulatorBuild {
    pub version: String,
    pub archive: RemoteArchive,
}

const WINDOWS: bool = cfg!(target_os = "windows");

/// Release source for an emulator under its configured channel
pub fn release_source(id: EmulatorId, settings: &Settings) -> ReleaseSource {
    match id {
        EmulatorId::Dolphin => {
            let strategy = match settings.dolphin.channel {
                DolphinChannel::Release => ReleaseStrategy::Latest,
                DolphinChannel::Development => ReleaseStrategy::Newest,
            };
            ReleaseSource {
                owner: "emu-resources",
                repo: "dolphin-builds",
                strategy,
                asset: if WINDOWS {
                    AssetFilter {
                        contains: &["windows"],
                        suffix: ".zip",
                    }
                } else {
                    AssetFilter {
                        contains: &["linux"],
                        suffix: ".tar.gz",
                    }
                },
            }
        }
        EmulatorId::Yuzu => match settings.yuzu.channel {
            YuzuChannel::Mainline => ReleaseSource {
                owner: "yuzu-emu",
                repo: "yuzu-mainline",
                strategy: ReleaseStrategy::Latest,
                asset: if WINDOWS {
                    AssetFilter {
                        contains: &["windows-msvc"],
                        suffix: ".zip",
                    }
                } else {
                    AssetFilter {
                        contains: &["linux"],
                        suffix: ".tar.gz",
                    }
                },
            },
            YuzuChannel::EarlyAccess => ReleaseSource {
                owner: "pineappleEA",
                repo: "pineapple-src",
                strategy: ReleaseStrategy::Latest,
                asset: if WINDOWS {
                    AssetFilter {
                        contains: &["Windows"],
                        suffix: ".zip",
                    }
                } else {
                    AssetFilter {
                        contains: &["Linux"],
                        suffix: ".tar.gz",
                    }
                },
            },
        },
        EmulatorId::Ryujinx => ReleaseSource {
            owner: "Ryujinx",
            repo: "release-channel-master",
            strategy: ReleaseStrategy::Latest,
            asset: if WINDOWS {
                AssetFilter {
                    contains: &["win_x64"],
                    suffix: ".zip",
                }
            } else {
                AssetFilter {
                    contains: &["linux_x64"],
                    suffix: ".tar.gz",
                }
            },
        },
        EmulatorId::Xenia => match settings.xenia.channel {
            // Xenia ships Windows binaries only; other platforms run them
            // through a compatibility layer
            XeniaChannel::Master => ReleaseSource {
                owner: "xenia-project",
                repo: "release-builds-windows",
                strategy: ReleaseStrategy::Latest,
                asset: AssetFilter {
                    contains: &["xenia_master"],
                    suffix: ".zip",
                },
            },
            XeniaChannel::Canary => ReleaseSource {
                owner: "xenia-canary",
                repo: "xenia-canary-releases",
                strategy: ReleaseStrategy::Latest,
                asset: AssetFilter {
                    contains: &["xenia_canary"],
                    suffix: ".zip",
                },
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(name: &str) -> GhAsset {
        GhAsset {
            name: name.to_string(),
            browser_download_url: format!("https://example.com/{}", name),
            size: 10,
        }
    }

    #[test]
    fn test_asset_filter_picks_first_match() {
        let filter = AssetFilter {
            contains: &["win_x64"],
            suffix: ".zip",
        };
        let assets = vec![
            asset("ryujinx-1.1.0-linux_x64.tar.gz"),
            asset("ryujinx-1.1.0-win_x64.zip"),
            asset("ryujinx-1.1.0-win_x64.zip.sig"),
        ];

        let picked = filter.pick(&assets).unwrap();
        assert_eq!(picked.name, "ryujinx-1.1.0-win_x64.zip");
    }

    #[test]
    fn test_asset_filter_no_match() {
        let filter = AssetFilter {
            contains: &["macos"],
            suffix: ".zip",
        };
        let assets = vec![asset("build-windows.zip")];

        assert!(filter.pick(&assets).is_none());
    }

    #[test]
    fn test_dolphin_development_uses_newest() {
        let mut settings = Settings::default();
        settings.dolphin.channel = DolphinChannel::Development;

        let source = release_source(EmulatorId::Dolphin, &settings);
        assert_eq!(source.strategy, ReleaseStrategy::Newest);
    }

    #[test]
    fn test_yuzu_channels_use_different_repos() {
        let mut settings = Settings::default();
        let mainline = release_source(EmulatorId::Yuzu, &settings);

        settings.yuzu.channel = YuzuChannel::EarlyAccess;
        let early_access = release_source(EmulatorId::Yuzu, &settings);

        assert_ne!(mainline.repo, early_access.repo);
    }

    #[test]
    fn test_xenia_canary_repo() {
        let mut settings = Settings::default();
        settings.xenia.channel = XeniaChannel::Canary;

        let source = release_source(EmulatorId::Xenia, &settings);
        assert_eq!(source.owner, "xenia-canary");
    }
}
