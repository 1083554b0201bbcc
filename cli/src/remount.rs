//! cpy-remount - remount CIRCUITPY with asynchronous writes disabled
//!
//! Works around macOS releases that delay FAT metadata writes long enough
//! for a CircuitPython board to reload a half-written file.

mod shared;

use clap::Parser;
use cpytools::{
    DEFAULT_SETTLE_DELAY, DEFAULT_VOLUME_NAME, DEFAULT_VOLUMES_ROOT, DryRunSystem, Error,
    HostSystem, MountSystem, MountTable, RemountOptions, SystemCommand, remount_volumes,
};
use std::path::PathBuf;
use std::time::Duration;

/// cpy-remount - remount CIRCUITPY with noasync
///
/// Unmounts the CIRCUITPY volume (and CIRCUITPY1, if a second board is
/// attached) and mounts it again with `-o noasync`. Needs sudo.
#[derive(Parser, Debug)]
#[command(name = "cpy-remount", version, about, long_about = None)]
struct Args {
    /// Volume label to remount
    #[arg(long, value_name = "NAME", default_value = DEFAULT_VOLUME_NAME)]
    volume: String,

    /// Directory volumes are mounted under
    #[arg(long, value_name = "DIR", default_value = DEFAULT_VOLUMES_ROOT)]
    volumes_root: PathBuf,

    /// Seconds to wait between recreating the mount point and mounting
    #[arg(long, value_name = "SECONDS", default_value_t = DEFAULT_SETTLE_DELAY.as_secs())]
    delay: u64,

    /// Run commands directly instead of through sudo
    #[arg(long)]
    no_sudo: bool,

    /// Print the commands without running them
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Verbose output
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Only print errors
    #[arg(short = 'q', long)]
    quiet: bool,
}

/// Shows a spinner while waiting for the device to settle.
struct SettleSpinner<S> {
    inner: S,
    quiet: bool,
}

impl<S: MountSystem> MountSystem for SettleSpinner<S> {
    fn mount_table(&mut self) -> cpytools::Result<MountTable> {
        self.inner.mount_table()
    }

    fn run(&mut self, command: &SystemCommand) -> cpytools::Result<()> {
        self.inner.run(command)
    }

    fn settle(&mut self, delay: Duration) {
        if self.quiet {
            self.inner.settle(delay);
            return;
        }
        let pb = shared::spinner(format!(
            "Waiting {}s for the device to settle...",
            delay.as_secs_f32()
        ));
        self.inner.settle(delay);
        pb.finish_and_clear();
    }
}

fn main() {
    let args: Args = shared::parse_args();
    shared::init_tracing(args.verbose, args.quiet);

    if let Err(error) = run(&args) {
        eprintln!("error: {error}");
        if let Error::VolumeNotMounted { name, .. } = &error {
            eprintln!("hint: is the board plugged in and showing up as {name}?");
        }
        std::process::exit(error.exit_code());
    }
}

fn run(args: &Args) -> cpytools::Result<()> {
    let options = RemountOptions::default()
        .with_volume_name(args.volume.as_str())
        .with_volumes_root(args.volumes_root.as_path())
        .with_settle_delay(Duration::from_secs(args.delay));

    let mut host = HostSystem::new();
    if args.no_sudo {
        host = host.without_elevation();
    }

    if args.dry_run {
        let prefix = if host.elevates() { "sudo " } else { "" };
        let mut dry = DryRunSystem::new(host);
        remount_volumes(&mut dry, &options)?;
        for command in dry.commands() {
            println!("{prefix}{command}");
        }
        return Ok(());
    }

    let mut system = SettleSpinner {
        inner: host,
        quiet: args.quiet,
    };
    let report = remount_volumes(&mut system, &options)?;

    if !args.quiet {
        for volume in &report.volumes {
            println!(
                "Remounted {} ({}) with {}",
                volume.mount_point.display(),
                volume.device,
                options.mount_options
            );
        }
    }
    Ok(())
}
