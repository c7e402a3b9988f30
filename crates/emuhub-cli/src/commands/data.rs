//! User data export, import and delete

use crate::args::{DataArgs, DataCmd, DataCopyArgs, DataDeleteArgs};
use crate::context::App;
use crate::progress;
use crate::prompt::ConsolePrompter;
use anyhow::Result;
use emuhub_emulator::{DataScope, Prompter, delete_data, export_data, import_data};
use emuhub_progress::ProgressHandle;

pub async fn run(args: DataArgs, assume_yes: bool) -> Result<()> {
    match args.cmd {
        DataCmd::Export(args) => export(args).await,
        DataCmd::Import(args) => import(args).await,
        DataCmd::Delete(args) => delete(args, assume_yes).await,
    }
}

async fn export(args: DataCopyArgs) -> Result<()> {
    let app = App::load()?;
    let emulator = app.emulator(args.emulator);
    let scope = scope_from(args.saves, args.folders);

    let handle = ProgressHandle::new();
    let worker = handle.clone();
    let target = args.path.clone();
    let outcome = progress::watch_blocking(&handle, move || {
        export_data(&emulator, &scope, &target, &worker)
    })
    .await?;

    println!(
        "Exported {} files to {}",
        outcome.files_copied,
        args.path.display()
    );
    Ok(())
}

async fn import(args: DataCopyArgs) -> Result<()> {
    let app = App::load()?;
    let emulator = app.emulator(args.emulator);
    let scope = scope_from(args.saves, args.folders);

    let handle = ProgressHandle::new();
    let worker = handle.clone();
    let source = args.path.clone();
    let outcome = progress::watch_blocking(&handle, move || {
        import_data(&emulator, &scope, &source, &worker)
    })
    .await?;

    println!(
        "Imported {} files from {}",
        outcome.files_copied,
        args.path.display()
    );
    Ok(())
}

async fn delete(args: DataDeleteArgs, assume_yes: bool) -> Result<()> {
    let app = App::load()?;
    let emulator = app.emulator(args.emulator);
    let scope = scope_from(args.saves, args.folders);

    let mut prompter = ConsolePrompter::new(assume_yes);
    let message = format!(
        "Delete {} for {}? This cannot be undone.",
        describe(&scope),
        args.emulator.display_name()
    );
    if !prompter.confirm(&message) {
        println!("Aborted");
        return Ok(());
    }

    let removed = delete_data(&emulator, &scope)?;
    if removed.is_empty() {
        println!("Nothing to delete");
    } else {
        for path in removed {
            println!("Removed {}", path.display());
        }
    }
    Ok(())
}

fn scope_from(saves: bool, folders: Vec<String>) -> DataScope {
    if saves {
        DataScope::Save
    } else if !folders.is_empty() {
        DataScope::Custom(folders)
    } else {
        DataScope::All
    }
}

fn describe(scope: &DataScope) -> String {
    match scope {
        DataScope::All => "all user data".to_string(),
        DataScope::Save => "the save data".to_string(),
        DataScope::Custom(folders) => format!("the folders {}", folders.join(", ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_from_flags() {
        assert_eq!(scope_from(true, vec![]), DataScope::Save);
        assert_eq!(scope_from(false, vec![]), DataScope::All);
        assert_eq!(
            scope_from(false, vec!["GC".to_string()]),
            DataScope::Custom(vec!["GC".to_string()])
        );
    }

    #[test]
    fn test_describe_custom_folders() {
        let scope = DataScope::Custom(vec!["GC".to_string(), "Wii".to_string()]);
        assert_eq!(describe(&scope), "the folders GC, Wii");
    }
}
