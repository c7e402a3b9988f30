//! Per-emulator behavior: directories, executables, archive layout

use emuhub_config::{EmulatorId, Settings, XeniaChannel, YuzuChannel};
use emuhub_firmware::{ContentLayout, SwitchPaths};
use std::path::{Path, PathBuf};

const WINDOWS: bool = cfg!(target_os = "windows");

/// One emulator as configured in the settings
///
/// Bundles the directories from the settings with the constants that differ
/// per emulator: where the executable sits inside an installed build, which
/// archive entry marks a valid build, which subdirectory a reinstall wipes,
/// and where Switch firmware and save data live.
#[derive(Debug, Clone)]
pub struct Emulator {
    id: EmulatorId,
    install_directory: PathBuf,
    user_directory: PathBuf,
    build_subdir: Option<&'static str>,
    executables: &'static [&'static str],
    path_binary: &'static str,
}

impl Emulator {
    pub fn from_settings(id: EmulatorId, settings: &Settings) -> Self {
        let (install_directory, user_directory) = match id {
            EmulatorId::Dolphin => (
                settings.dolphin.install_directory.clone(),
                settings.dolphin.user_directory.clone(),
            ),
            EmulatorId::Yuzu => (
                settings.yuzu.install_directory.clone(),
                settings.yuzu.user_directory.clone(),
            ),
            EmulatorId::Ryujinx => (
                settings.ryujinx.install_directory.clone(),
                settings.ryujinx.user_directory.clone(),
            ),
            EmulatorId::Xenia => (
                settings.xenia.install_directory.clone(),
                settings.xenia.user_directory.clone(),
            ),
        };

        let (build_subdir, executables) = match id {
            EmulatorId::Dolphin => {
                if WINDOWS {
                    (None, &["Dolphin.exe"] as &[&str])
                } else {
                    (None, &["dolphin-emu"] as &[&str])
                }
            }
            EmulatorId::Yuzu => match (settings.yuzu.channel, WINDOWS) {
                (YuzuChannel::Mainline, true) => (
                    Some("yuzu-windows-msvc"),
                    &["yuzu-windows-msvc/yuzu.exe"] as &[&str],
                ),
                (YuzuChannel::Mainline, false) => (Some("yuzu"), &["yuzu/yuzu"] as &[&str]),
                (YuzuChannel::EarlyAccess, true) => (
                    Some("yuzu-windows-msvc-early-access"),
                    &["yuzu-windows-msvc-early-access/yuzu.exe"] as &[&str],
                ),
                (YuzuChannel::EarlyAccess, false) => (
                    Some("yuzu-early-access"),
                    &["yuzu-early-access/yuzu"] as &[&str],
                ),
            },
            EmulatorId::Ryujinx => {
                if WINDOWS {
                    (Some("publish"), &["publish/Ryujinx.exe"] as &[&str])
                } else {
                    (Some("publish"), &["publish/Ryujinx"] as &[&str])
                }
            }
            EmulatorId::Xenia => match settings.xenia.channel {
                XeniaChannel::Master => (None, &["xenia.exe"] as &[&str]),
                XeniaChannel::Canary => (None, &["xenia_canary.exe"] as &[&str]),
            },
        };

        let path_binary = match id {
            EmulatorId::Dolphin => "dolphin-emu",
            EmulatorId::Yuzu => "yuzu",
            EmulatorId::Ryujinx => "ryujinx",
            EmulatorId::Xenia => "xenia",
        };

        Self {
            id,
            install_directory,
            user_directory,
            build_subdir,
            executables,
            path_binary,
        }
    }

    pub fn id(&self) -> EmulatorId {
        self.id
    }

    pub fn install_directory(&self) -> &Path {
        &self.install_directory
    }

    pub fn user_directory(&self) -> &Path {
        &self.user_directory
    }

    /// The directory a build install creates and a reinstall or delete wipes
    ///
    /// Ryujinx and yuzu archives carry their own top-level directory; Dolphin
    /// and Xenia archives extract straight into the install directory.
    pub fn build_root(&self) -> PathBuf {
        match self.build_subdir {
            Some(subdir) => self.install_directory.join(subdir),
            None => self.install_directory.clone(),
        }
    }

    /// Archive entries that identify a valid build of this emulator
    ///
    /// Any one of them is enough; the lists cover both operating systems and
    /// every release channel so locally supplied archives pass too.
    pub fn archive_markers(&self) -> &'static [&'static str] {
        match self.id {
            EmulatorId::Dolphin => &["Dolphin.exe", "dolphin-emu"],
            EmulatorId::Yuzu => &[
                "yuzu-windows-msvc/yuzu.exe",
                "yuzu-windows-msvc-early-access/yuzu.exe",
                "yuzu/yuzu",
                "yuzu-early-access/yuzu",
            ],
            EmulatorId::Ryujinx => &["publish/Ryujinx.exe", "publish/Ryujinx"],
            EmulatorId::Xenia => &["xenia.exe", "xenia_canary.exe"],
        }
    }

    /// First existing executable under the install directory, falling back
    /// to a binary on `$PATH`
    pub fn executable_path(&self) -> Option<PathBuf> {
        for candidate in self.executables {
            let path = self.install_directory.join(candidate);
            if path.is_file() {
                return Some(path);
            }
        }
        which::which(self.path_binary).ok()
    }

    /// Whether a managed build is present in the install directory
    pub fn is_installed(&self) -> bool {
        self.executables
            .iter()
            .any(|candidate| self.install_directory.join(candidate).is_file())
    }

    /// Switch firmware and key locations, for the emulators that have them
    pub fn switch_paths(&self) -> Option<SwitchPaths> {
        match self.id {
            EmulatorId::Ryujinx => Some(SwitchPaths::new(
                self.user_directory.join("bis/system/Contents/registered"),
                self.user_directory.join("system"),
                ContentLayout::Registered,
            )),
            EmulatorId::Yuzu => Some(SwitchPaths::new(
                self.user_directory.join("nand/system/Contents/registered"),
                self.user_directory.join("keys"),
                ContentLayout::Flat,
            )),
            _ => None,
        }
    }

    /// Directories under the user directory that hold save data
    pub fn save_data_subdirs(&self) -> &'static [&'static str] {
        match self.id {
            EmulatorId::Dolphin => &["GC", "Wii", "StateSaves"],
            EmulatorId::Yuzu => &["nand/user/save"],
            EmulatorId::Ryujinx => &["bis/user/save"],
            EmulatorId::Xenia => &["content"],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_under(root: &Path) -> Settings {
        let mut settings = Settings::default();
        settings.dolphin.install_directory = root.join("dolphin");
        settings.dolphin.user_directory = root.join("dolphin-user");
        settings.yuzu.install_directory = root.join("yuzu");
        settings.yuzu.user_directory = root.join("yuzu-user");
        settings.ryujinx.install_directory = root.join("ryujinx");
        settings.ryujinx.user_directory = root.join("ryujinx-user");
        settings.xenia.install_directory = root.join("xenia");
        settings.xenia.user_directory = root.join("xenia");
        settings
    }

    #[test]
    fn test_ryujinx_build_root_is_publish() {
        let settings = settings_under(Path::new("/tmp/emuhub-test"));
        let emulator = Emulator::from_settings(EmulatorId::Ryujinx, &settings);

        assert_eq!(
            emulator.build_root(),
            Path::new("/tmp/emuhub-test/ryujinx/publish")
        );
    }

    #[test]
    fn test_xenia_build_root_is_install_directory() {
        let settings = settings_under(Path::new("/tmp/emuhub-test"));
        let emulator = Emulator::from_settings(EmulatorId::Xenia, &settings);

        assert_eq!(emulator.build_root(), Path::new("/tmp/emuhub-test/xenia"));
    }

    #[test]
    fn test_yuzu_channel_changes_build_root() {
        let mut settings = settings_under(Path::new("/tmp/emuhub-test"));
        let mainline = Emulator::from_settings(EmulatorId::Yuzu, &settings);

        settings.yuzu.channel = emuhub_config::YuzuChannel::EarlyAccess;
        let early_access = Emulator::from_settings(EmulatorId::Yuzu, &settings);

        assert_ne!(mainline.build_root(), early_access.build_root());
    }

    #[test]
    fn test_switch_paths_layouts() {
        let settings = settings_under(Path::new("/tmp/emuhub-test"));

        let ryujinx = Emulator::from_settings(EmulatorId::Ryujinx, &settings)
            .switch_paths()
            .unwrap();
        assert_eq!(ryujinx.layout, ContentLayout::Registered);
        assert_eq!(
            ryujinx.firmware_dir,
            Path::new("/tmp/emuhub-test/ryujinx-user/bis/system/Contents/registered")
        );
        assert_eq!(
            ryujinx.key_dir,
            Path::new("/tmp/emuhub-test/ryujinx-user/system")
        );

        let yuzu = Emulator::from_settings(EmulatorId::Yuzu, &settings)
            .switch_paths()
            .unwrap();
        assert_eq!(yuzu.layout, ContentLayout::Flat);
        assert_eq!(
            yuzu.key_dir,
            Path::new("/tmp/emuhub-test/yuzu-user/keys")
        );
    }

    #[test]
    fn test_only_switch_emulators_have_switch_paths() {
        let settings = settings_under(Path::new("/tmp/emuhub-test"));

        for id in EmulatorId::ALL {
            let emulator = Emulator::from_settings(id, &settings);
            assert_eq!(emulator.switch_paths().is_some(), id.is_switch());
        }
    }

    #[test]
    fn test_markers_cover_executables() {
        let settings = settings_under(Path::new("/tmp/emuhub-test"));

        // Whatever executable a build provides must pass verification
        for id in EmulatorId::ALL {
            let emulator = Emulator::from_settings(id, &settings);
            for exe in emulator.executables {
                assert!(
                    emulator.archive_markers().contains(exe),
                    "{} executable {} missing from markers",
                    id,
                    exe
                );
            }
        }
    }
}
