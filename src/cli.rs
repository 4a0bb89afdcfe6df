use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use crate::auth::{format_phone_number, validate_phone_number, OtpEntry, OtpVerifier, ResendCooldown, Strictness};
use crate::capture::{CaptureController, CaptureSession, CaptureStage, CAPTURE_DURATION_SECS};
use crate::configuration::{AppConfig, DemoSettingsStore};
use crate::flow::{AuthFlow, VitalsEvent, VitalsFlow, LOADING_DELAY};
use crate::models::{DemoSettingsPatch, VitalStatus, VitalsResult};
use crate::processing::{ProcessingController, ProcessingError, ProcessingState, ProcessingStep};
use crate::services::{
    export_vitals, AuthService, ExportFormat, MemoryStore, MockAuthService, MockLatency, MockVitalsService, PermissionProvider, Recording,
    StaticPermissionProvider, StorageService, VitalsProcessingService,
};

/// HealthMonitor - headless driver for the patient monitoring demo flow
#[derive(Parser)]
#[command(name = "healthmonitor")]
#[command(about = "Drive the HealthMonitor demo flow from the terminal")]
pub struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Format a phone number as it is typed
    FormatPhone { raw: String },
    /// Check whether a phone number is a valid 10-digit number
    ValidatePhone { raw: String },
    /// Check a one-time code
    VerifyOtp {
        code: String,
        /// Accept any complete code
        #[arg(long)]
        permissive: bool,
    },
    /// Record a simulated 30 second capture
    Capture {
        /// Stop the recording early after this many seconds
        #[arg(long)]
        stop_after: Option<u32>,
        /// Refuse the camera permission
        #[arg(long)]
        deny_camera: bool,
    },
    /// Run the simulated processing pipeline
    Process {
        #[arg(long)]
        fast: bool,
        #[arg(long)]
        force_upload_failure: bool,
        #[arg(long)]
        force_network_issue: bool,
        #[arg(long)]
        force_processing_timeout: bool,
        /// Retries after a failure
        #[arg(long, default_value_t = 0)]
        retries: u32,
    },
    /// Walk through sign in, capture, processing and results
    Demo {
        #[arg(long)]
        phone: String,
        #[arg(long)]
        otp: String,
        #[arg(long)]
        fast: bool,
        /// Length of the simulated recording
        #[arg(long, default_value_t = CAPTURE_DURATION_SECS)]
        capture_secs: u32,
        /// Export the results in this format
        #[arg(long, value_enum)]
        export: Option<ExportFormat>,
        /// Directory for exported files
        #[arg(long, default_value = ".")]
        export_dir: PathBuf,
    },
    /// Show the effective configuration
    Settings,
}

pub async fn run_cli(cli: Cli, config: AppConfig) -> Result<()> {
    let settings = Arc::new(DemoSettingsStore::new(config.demo));

    match cli.command {
        Commands::FormatPhone { raw } => format_phone(&raw),
        Commands::ValidatePhone { raw } => validate_phone(&raw),
        Commands::VerifyOtp { code, permissive } => {
            let strictness = if permissive { Strictness::Permissive } else { config.auth.strictness };
            verify_otp(&code, strictness)
        }
        Commands::Capture { stop_after, deny_camera } => {
            if deny_camera {
                settings.patch(DemoSettingsPatch::default().force_camera_permission_denied(true));
            }
            capture(settings, CaptureSession::new(), stop_after).await.map(|_| ())
        }
        Commands::Process {
            fast,
            force_upload_failure,
            force_network_issue,
            force_processing_timeout,
            retries,
        } => {
            let mut patch = DemoSettingsPatch::default();
            if fast {
                patch = patch.fast_mode(true);
            }
            if force_upload_failure {
                patch = patch.force_upload_failure(true);
            }
            if force_network_issue {
                patch = patch.force_network_issue(true);
            }
            if force_processing_timeout {
                patch = patch.force_processing_timeout(true);
            }
            settings.patch(patch);
            process(settings, retries).await.map(|_| ())
        }
        Commands::Demo {
            phone,
            otp,
            fast,
            capture_secs,
            export,
            export_dir,
        } => {
            if fast {
                settings.patch(DemoSettingsPatch::default().fast_mode(true));
            }
            let export = export.map(|format| (format, export_dir));
            demo(settings, config.auth.strictness, &phone, &otp, capture_secs, export).await
        }
        Commands::Settings => show_settings(&config, cli.config.as_deref()),
    }
}

fn format_phone(raw: &str) -> Result<()> {
    println!("📞 {}", format_phone_number(raw));
    Ok(())
}

fn validate_phone(raw: &str) -> Result<()> {
    let formatted = format_phone_number(raw);
    if validate_phone_number(raw) {
        println!("✅ {} is a valid phone number", formatted);
        Ok(())
    } else {
        bail!("'{}' is not a valid 10-digit phone number", raw)
    }
}

fn verify_otp(code: &str, strictness: Strictness) -> Result<()> {
    println!("🔐 Verifying code ({} mode)...", strictness);
    OtpVerifier::new(strictness).verify(code)?;
    println!("✅ Code accepted");
    Ok(())
}

async fn capture(settings: Arc<DemoSettingsStore>, session: CaptureSession, stop_after: Option<u32>) -> Result<u32> {
    let permissions: Arc<dyn PermissionProvider> = Arc::new(StaticPermissionProvider::granted());
    let mut controller = CaptureController::with_session(settings, permissions, session);
    let mut updates = controller.subscribe();
    let duration = updates.borrow().duration_secs();

    println!("📷 Camera ready");
    if let Err(e) = controller.start().await {
        println!("🚫 {}", e);
        return Err(e.into());
    }
    println!("⏺️  Recording...");

    loop {
        updates.changed().await.context("capture controller went away")?;
        let state = updates.borrow_and_update().state().clone();

        match state.stage {
            CaptureStage::Recording => {
                println!(
                    "   {:>5.1}%  {}s remaining",
                    state.progress_percent, state.seconds_remaining
                );
                let elapsed = duration - state.seconds_remaining;
                if stop_after.is_some_and(|limit| elapsed >= limit) {
                    controller.stop()?;
                }
            }
            CaptureStage::Complete => break,
            CaptureStage::Ready => bail!("recording was reset"),
        }
    }

    controller.continue_to_processing()?;
    let recorded = duration - controller.snapshot().seconds_remaining;
    println!("✅ Recording complete ({}s captured)", recorded);
    Ok(recorded)
}

async fn process(settings: Arc<DemoSettingsStore>, retries: u32) -> Result<ProcessingState> {
    if settings.get().injects_faults() {
        println!("⚠️  Fault injection is enabled");
    }
    let mut controller = ProcessingController::new(settings);

    println!("⚙️  Processing recording...");
    controller.start();

    let mut attempts_left = retries;
    loop {
        match follow_processing(&controller).await {
            Ok(state) => {
                println!("✅ Processing complete in {} ms", state.elapsed_ms);
                return Ok(state);
            }
            Err(ProcessingError::Failed(fault)) if attempts_left > 0 => {
                println!("❌ {}", fault);
                attempts_left -= 1;
                println!("🔄 Retrying ({} left)...", attempts_left);
                controller.retry()?;
            }
            Err(e) => {
                println!("❌ {}", e);
                return Err(e.into());
            }
        }
    }
}

/// Print each step as it becomes active until the run completes or fails
async fn follow_processing(controller: &ProcessingController) -> Result<ProcessingState, ProcessingError> {
    let mut updates = controller.subscribe();
    let mut announced: Option<usize> = None;

    loop {
        let state = updates.borrow_and_update().state().clone();

        if announced.map_or(true, |index| state.current_step_index > index) {
            let first = announced.map_or(0, |index| index + 1);
            for index in first..=state.current_step_index {
                if let Some(step) = ProcessingStep::from_index(index) {
                    println!("   ▶️  {}", step);
                }
            }
            announced = Some(state.current_step_index);
        }

        if let Some(fault) = state.error {
            return Err(fault.into());
        }
        if state.completed {
            return Ok(state);
        }

        if updates.changed().await.is_err() {
            return Err(ProcessingError::Cancelled);
        }
    }
}

async fn demo(
    settings: Arc<DemoSettingsStore>,
    strictness: Strictness,
    phone: &str,
    otp: &str,
    capture_secs: u32,
    export: Option<(ExportFormat, PathBuf)>,
) -> Result<()> {
    let storage = StorageService::new(MemoryStore::new());
    let auth_service = MockAuthService::default();
    let mut auth = AuthFlow::new(strictness);

    println!("👋 Welcome to HealthMonitor");
    auth.get_started()?;

    println!("📞 Signing in with {}", format_phone_number(phone));
    auth.submit_phone(phone)?;
    let phone_number = auth.phone_number().unwrap_or_default().to_string();
    let message = auth_service.send_otp(&phone_number).await?;
    let cooldown = ResendCooldown::new();
    println!("📨 {} (resend available in {}s)", message, cooldown.remaining_secs());

    let mut entry = OtpEntry::new();
    if !entry.paste(otp) {
        for (index, c) in otp.chars().take(entry.cells().len()).enumerate() {
            entry.input(index, &c.to_string());
        }
    }
    auth.submit_otp(&entry)?;
    let session = auth_service.verify_otp(&phone_number, otp).await?;
    storage.store_auth_token(&session.token).await;
    storage.store_user_data(&session.user).await;

    println!("⏳ Loading your dashboard...");
    tokio::time::sleep(LOADING_DELAY).await;
    auth.finish_loading()?;
    println!("✅ Signed in as {}", session.user.name);

    let mut vitals = VitalsFlow::new();
    vitals.apply(VitalsEvent::StartCapture)?;
    let recorded = capture(Arc::clone(&settings), CaptureSession::with_duration(capture_secs), None).await?;

    vitals.apply(VitalsEvent::CaptureComplete)?;
    process(settings, 0).await?;

    let service = MockVitalsService::new(MockLatency::none());
    let id = service.submit_recording(&Recording::new(Vec::new(), recorded)).await?;
    let result = service.process_recording(&id).await?;
    storage.push_vitals(result.clone()).await;
    vitals.apply(VitalsEvent::ProcessingComplete(result.clone()))?;

    print_results(&result);
    if let Some((format, dir)) = export {
        let path = export_vitals(&result, format, &dir)?;
        println!("💾 Exported results to {}", path.display());
    }

    auth.sign_out()?;
    storage.clear_all().await;
    auth_service.logout().await;
    println!("👋 Signed out");
    Ok(())
}

fn print_results(result: &VitalsResult) {
    println!();
    println!("📊 Results ({})", result.timestamp.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("  ❤️  Heart rate:     {} bpm  {}", result.heart_rate_bpm, status_badge(result.heart_rate_status()));
    println!("  🫁 SpO2:           {}%  {}", result.spo2_percent, status_badge(result.spo2_status()));
    println!(
        "  🩸 Blood pressure: {} mmHg  {}",
        result.blood_pressure,
        status_badge(result.blood_pressure_status())
    );
    println!("  🌡️  Temperature:    {:.1}°C  {}", result.temperature, status_badge(result.temperature_status()));
    println!("  Overall: {}", status_badge(result.overall_status()));
    println!();
}

fn status_badge(status: VitalStatus) -> String {
    match status {
        VitalStatus::Normal => format!("✅ {}", status),
        VitalStatus::Warning => format!("⚠️  {}", status),
        VitalStatus::Critical => format!("🚨 {}", status),
    }
}

fn show_settings(config: &AppConfig, explicit: Option<&std::path::Path>) -> Result<()> {
    let source = match explicit {
        Some(path) => path.display().to_string(),
        None => AppConfig::default_path()
            .filter(|path| path.exists())
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "built-in defaults".to_string()),
    };

    println!("⚙️  Configuration ({})", source);
    println!();
    let rendered = toml::to_string_pretty(config).context("Failed to render configuration")?;
    println!("{}", rendered);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_process_flags() {
        let cli = Cli::try_parse_from(["healthmonitor", "process", "--fast", "--force-network-issue", "--retries", "2"])
            .unwrap();
        match cli.command {
            Commands::Process {
                fast,
                force_network_issue,
                force_upload_failure,
                retries,
                ..
            } => {
                assert!(fast);
                assert!(force_network_issue);
                assert!(!force_upload_failure);
                assert_eq!(retries, 2);
            }
            _ => panic!("expected process command"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["healthmonitor", "settings", "-v", "--config", "/tmp/hm.toml"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/hm.toml")));
    }

    #[test]
    fn test_verify_otp_modes() {
        assert!(verify_otp("123456", Strictness::Strict).is_ok());
        assert!(verify_otp("111111", Strictness::Strict).is_err());
        assert!(verify_otp("111111", Strictness::Permissive).is_ok());
        assert!(verify_otp("123", Strictness::Permissive).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_capture_stops_early() {
        let settings = Arc::new(DemoSettingsStore::default());
        let recorded = capture(settings, CaptureSession::with_duration(10), Some(4)).await.unwrap();
        assert_eq!(recorded, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_capture_refused_when_camera_denied() {
        let settings = Arc::new(DemoSettingsStore::default());
        settings.patch(DemoSettingsPatch::default().force_camera_permission_denied(true));
        assert!(capture(settings, CaptureSession::new(), None).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_process_retries_are_bounded() {
        let settings = Arc::new(DemoSettingsStore::default());
        settings.patch(DemoSettingsPatch::default().fast_mode(true).force_upload_failure(true));
        assert!(process(settings, 2).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_process_fast_mode() {
        let settings = Arc::new(DemoSettingsStore::default());
        settings.patch(DemoSettingsPatch::default().fast_mode(true));
        let state = process(settings, 0).await.unwrap();
        assert_eq!(state.elapsed_ms, 4500);
        assert!(state.completed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_demo_walks_every_stage() {
        let settings = Arc::new(DemoSettingsStore::default());
        settings.patch(DemoSettingsPatch::default().fast_mode(true));
        demo(settings, Strictness::Strict, "5551234567", "123456", 3, None).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_demo_exports_csv() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Arc::new(DemoSettingsStore::default());
        settings.patch(DemoSettingsPatch::default().fast_mode(true));

        let export = Some((ExportFormat::Csv, dir.path().to_path_buf()));
        demo(settings, Strictness::Strict, "5551234567", "123456", 3, export).await.unwrap();

        let exported: Vec<_> = std::fs::read_dir(dir.path()).unwrap().map(|e| e.unwrap().path()).collect();
        assert_eq!(exported.len(), 1);
        let csv = std::fs::read_to_string(&exported[0]).unwrap();
        assert!(csv.starts_with("Date,Heart Rate,SpO2,Blood Pressure,Temperature\n"));
        assert!(csv.ends_with(",72,98,118/76,36.8"));
    }

    #[test]
    fn test_parse_demo_export() {
        let cli = Cli::try_parse_from([
            "healthmonitor", "demo", "--phone", "5551234567", "--otp", "123456", "--export", "csv",
        ])
        .unwrap();
        match cli.command {
            Commands::Demo { export, export_dir, .. } => {
                assert_eq!(export, Some(ExportFormat::Csv));
                assert_eq!(export_dir, PathBuf::from("."));
            }
            _ => panic!("expected demo command"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_demo_rejects_wrong_code() {
        let settings = Arc::new(DemoSettingsStore::default());
        let err = demo(settings, Strictness::Strict, "5551234567", "000000", 3, None).await.unwrap_err();
        assert!(err.to_string().contains("code"));
    }
}
