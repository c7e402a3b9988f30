//! Integration tests for build installation and emulator management

use emuhub_catalog::{Downloader, FirmwareKeyCatalog};
use emuhub_config::{EmulatorId, Settings, VersionKey, VersionStore};
use emuhub_emulator::{
    Emulator, EmulatorError, ReconcilePlan, delete_build, execute_reconcile_plan, install_build,
    installed_version, launch, verify_build_archive,
};
use emuhub_progress::ProgressHandle;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use tempfile::TempDir;

/// Test environment with per-emulator install and user directories
struct EmulatorTestEnv {
    temp_dir: TempDir,
    settings: Settings,
    versions_path: PathBuf,
}

impl EmulatorTestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();

        let mut settings = Settings::default();
        settings.dolphin.install_directory = root.join("dolphin");
        settings.dolphin.user_directory = root.join("dolphin-user");
        settings.yuzu.install_directory = root.join("yuzu");
        settings.yuzu.user_directory = root.join("yuzu-user");
        settings.ryujinx.install_directory = root.join("ryujinx");
        settings.ryujinx.user_directory = root.join("ryujinx-user");
        settings.xenia.install_directory = root.join("xenia");
        settings.xenia.user_directory = root.join("xenia");

        let versions_path = root.join("versions.json");

        Self {
            temp_dir,
            settings,
            versions_path,
        }
    }

    fn emulator(&self, id: EmulatorId) -> Emulator {
        Emulator::from_settings(id, &self.settings)
    }

    fn versions(&self) -> VersionStore {
        VersionStore::load(&self.versions_path).unwrap()
    }

    fn write_zip(&self, name: &str, entries: &[(&str, &[u8])]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let file = File::create(&path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);

        for (entry_name, data) in entries {
            writer.start_file(*entry_name, options).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap();
        path
    }

    fn write_tar_gz(&self, name: &str, entries: &[(&str, &[u8])]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let file = File::create(&path).unwrap();
        let encoder = GzEncoder::new(file, Compression::default());
        let mut builder = tar::Builder::new(encoder);

        for (entry_name, data) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o755);
            header.set_cksum();
            builder.append_data(&mut header, entry_name, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
        path
    }
}

#[test]
fn test_verify_accepts_matching_build() {
    let env = EmulatorTestEnv::new();
    let emulator = env.emulator(EmulatorId::Ryujinx);
    let archive = env.write_zip(
        "ryujinx-win_x64.zip",
        &[("publish/Ryujinx.exe", b"MZ"), ("publish/lib.dll", b"x")],
    );

    verify_build_archive(&emulator, &archive).unwrap();
}

#[test]
fn test_verify_rejects_foreign_build() {
    let env = EmulatorTestEnv::new();
    let emulator = env.emulator(EmulatorId::Ryujinx);
    let archive = env.write_zip("dolphin.zip", &[("Dolphin.exe", b"MZ")]);

    let result = verify_build_archive(&emulator, &archive);
    assert!(matches!(result, Err(EmulatorError::InvalidArchive(_))));
}

#[test]
fn test_verify_reads_tar_archives() {
    let env = EmulatorTestEnv::new();
    let emulator = env.emulator(EmulatorId::Ryujinx);
    let archive = env.write_tar_gz(
        "ryujinx-linux_x64.tar.gz",
        &[("publish/Ryujinx", b"ELF"), ("publish/libSkia.so", b"x")],
    );

    verify_build_archive(&emulator, &archive).unwrap();
}

#[test]
fn test_verify_rejects_unknown_archive_type() {
    let env = EmulatorTestEnv::new();
    let emulator = env.emulator(EmulatorId::Ryujinx);
    let path = env.temp_dir.path().join("ryujinx.7z");
    fs::write(&path, b"7z").unwrap();

    let result = verify_build_archive(&emulator, &path);
    assert!(matches!(result, Err(EmulatorError::UnsupportedArchive(_))));
}

#[test]
fn test_install_build_from_zip() {
    let env = EmulatorTestEnv::new();
    let emulator = env.emulator(EmulatorId::Ryujinx);
    let mut versions = env.versions();
    let archive = env.write_zip(
        "ryujinx-1.1.1300-win_x64.zip",
        &[("publish/Ryujinx.exe", b"MZ"), ("publish/lib.dll", b"x")],
    );

    let build_root = install_build(
        &emulator,
        &archive,
        "1.1.1300",
        &mut versions,
        &ProgressHandle::new(),
    )
    .unwrap();

    assert_eq!(build_root, emulator.build_root());
    assert!(build_root.join("Ryujinx.exe").is_file());
    assert_eq!(
        versions.get(VersionKey::Build(EmulatorId::Ryujinx)),
        Some("1.1.1300")
    );
}

#[test]
fn test_install_build_from_tar_gz() {
    let env = EmulatorTestEnv::new();
    let emulator = env.emulator(EmulatorId::Ryujinx);
    let mut versions = env.versions();
    let archive = env.write_tar_gz(
        "ryujinx-1.1.1300-linux_x64.tar.gz",
        &[("publish/Ryujinx", b"ELF")],
    );

    install_build(
        &emulator,
        &archive,
        "1.1.1300",
        &mut versions,
        &ProgressHandle::new(),
    )
    .unwrap();

    assert!(emulator.build_root().join("Ryujinx").is_file());
}

#[test]
fn test_install_build_replaces_previous_build() {
    let env = EmulatorTestEnv::new();
    let emulator = env.emulator(EmulatorId::Ryujinx);
    let mut versions = env.versions();

    let stale = emulator.build_root().join("stale.dll");
    fs::create_dir_all(emulator.build_root()).unwrap();
    fs::write(&stale, b"old").unwrap();

    let archive = env.write_zip("ryujinx.zip", &[("publish/Ryujinx.exe", b"MZ")]);
    install_build(
        &emulator,
        &archive,
        "1.1.1301",
        &mut versions,
        &ProgressHandle::new(),
    )
    .unwrap();

    assert!(!stale.exists());
    assert!(emulator.build_root().join("Ryujinx.exe").is_file());
}

#[test]
fn test_install_build_records_empty_version_for_local_archives() {
    let env = EmulatorTestEnv::new();
    let emulator = env.emulator(EmulatorId::Xenia);
    let mut versions = env.versions();
    let archive = env.write_zip("xenia_custom.zip", &[("xenia.exe", b"MZ")]);

    install_build(&emulator, &archive, "", &mut versions, &ProgressHandle::new()).unwrap();

    assert_eq!(versions.get(VersionKey::Build(EmulatorId::Xenia)), Some(""));
    assert_eq!(installed_version(&emulator, &versions), Some(String::new()));
}

#[test]
fn test_install_build_cancel_rolls_back() {
    let env = EmulatorTestEnv::new();
    let emulator = env.emulator(EmulatorId::Ryujinx);
    let mut versions = env.versions();
    let archive = env.write_zip("ryujinx.zip", &[("publish/Ryujinx.exe", b"MZ")]);

    let progress = ProgressHandle::new();
    progress.cancel();

    let result = install_build(&emulator, &archive, "1.1.1300", &mut versions, &progress);

    assert!(matches!(result, Err(EmulatorError::Cancelled)));
    assert!(!emulator.build_root().exists());
    assert_eq!(versions.get(VersionKey::Build(EmulatorId::Ryujinx)), None);
}

#[test]
fn test_delete_build() {
    let env = EmulatorTestEnv::new();
    let emulator = env.emulator(EmulatorId::Ryujinx);
    let mut versions = env.versions();
    let archive = env.write_zip("ryujinx.zip", &[("publish/Ryujinx.exe", b"MZ")]);
    install_build(
        &emulator,
        &archive,
        "1.1.1300",
        &mut versions,
        &ProgressHandle::new(),
    )
    .unwrap();

    delete_build(&emulator, &mut versions).unwrap();

    assert!(!emulator.build_root().exists());
    assert!(!emulator.is_installed());
    assert_eq!(versions.get(VersionKey::Build(EmulatorId::Ryujinx)), None);
}

#[test]
fn test_delete_build_requires_an_install() {
    let env = EmulatorTestEnv::new();
    let emulator = env.emulator(EmulatorId::Ryujinx);
    let mut versions = env.versions();

    let result = delete_build(&emulator, &mut versions);
    assert!(matches!(result, Err(EmulatorError::NotInstalled(_))));
}

#[test]
fn test_installed_version_reports_presence() {
    let env = EmulatorTestEnv::new();
    let emulator = env.emulator(EmulatorId::Ryujinx);
    let mut versions = env.versions();

    assert_eq!(installed_version(&emulator, &versions), None);

    let archive = env.write_zip("ryujinx.zip", &[("publish/Ryujinx.exe", b"MZ")]);
    install_build(
        &emulator,
        &archive,
        "1.1.1300",
        &mut versions,
        &ProgressHandle::new(),
    )
    .unwrap();

    assert_eq!(
        installed_version(&emulator, &versions),
        Some("1.1.1300".to_string())
    );
}

#[test]
fn test_launch_without_executable() {
    let env = EmulatorTestEnv::new();
    let emulator = env.emulator(EmulatorId::Ryujinx);

    let result = launch(&emulator, true);
    assert!(matches!(result, Err(EmulatorError::ExecutableNotFound(_))));
}

#[tokio::test]
async fn test_execute_empty_plan_is_a_no_op() {
    let env = EmulatorTestEnv::new();
    let emulator = env.emulator(EmulatorId::Ryujinx);
    let mut versions = env.versions();
    let downloader = Downloader::new(env.temp_dir.path().join("downloads"));

    let outcome = execute_reconcile_plan(
        &ReconcilePlan::default(),
        &emulator,
        &FirmwareKeyCatalog::default(),
        &downloader,
        &mut versions,
        true,
        &ProgressHandle::new(),
    )
    .await
    .unwrap();

    assert!(outcome.keys_installed.is_none());
    assert!(outcome.firmware_installed.is_none());
}

#[tokio::test]
async fn test_execute_plan_needs_catalog_entries() {
    let env = EmulatorTestEnv::new();
    let emulator = env.emulator(EmulatorId::Ryujinx);
    let mut versions = env.versions();
    let downloader = Downloader::new(env.temp_dir.path().join("downloads"));

    let plan = ReconcilePlan {
        keys: Some("17.0.0".parse().unwrap()),
        ..Default::default()
    };

    let result = execute_reconcile_plan(
        &plan,
        &emulator,
        &FirmwareKeyCatalog::default(),
        &downloader,
        &mut versions,
        true,
        &ProgressHandle::new(),
    )
    .await;

    assert!(matches!(result, Err(EmulatorError::Catalog(_))));
}

#[tokio::test]
async fn test_execute_plan_rejects_non_switch_emulators() {
    let env = EmulatorTestEnv::new();
    let emulator = env.emulator(EmulatorId::Dolphin);
    let mut versions = env.versions();
    let downloader = Downloader::new(env.temp_dir.path().join("downloads"));

    let result = execute_reconcile_plan(
        &ReconcilePlan::default(),
        &emulator,
        &FirmwareKeyCatalog::default(),
        &downloader,
        &mut versions,
        true,
        &ProgressHandle::new(),
    )
    .await;

    assert!(matches!(result, Err(EmulatorError::NotSwitch(_))));
}
