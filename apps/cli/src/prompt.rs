//! Interactive prompts: profile selection, cost confirmation, and the
//! resume cross-check.

use std::io::Write;

use anyhow::Context;
use chainvid_chunks::Chunk;
use chainvid_fees::{CostEstimate, CostFigure, PacingProfile, project_costs};
use chainvid_progress::ProgressRecord;

/// Hex characters of the last confirmed chunk shown for the resume
/// cross-check.
const RESUME_PREFIX_LEN: usize = 30;

/// Prints `question` and reads one trimmed line from stdin.
pub fn read_line(question: &str) -> anyhow::Result<String> {
    print!("{question}");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin()
        .read_line(&mut answer)
        .context("reading stdin")?;
    Ok(answer.trim().to_string())
}

fn ask_yes(question: &str) -> anyhow::Result<bool> {
    Ok(read_line(question)?.eq_ignore_ascii_case("y"))
}

/// Asks for the video path; drag-and-drop quoting is stripped.
pub fn video_path() -> anyhow::Result<std::path::PathBuf> {
    let raw = read_line("Enter the path to the video file (or drag and drop it here): ")?;
    Ok(std::path::PathBuf::from(
        raw.trim_matches(|c| c == '"' || c == '\'').to_string(),
    ))
}

/// Asks for the output height until a sane value is given.
pub fn output_height() -> anyhow::Result<u32> {
    loop {
        let raw = read_line(
            "Enter the height for the video (e.g., 90, 144, 240, 360, 480, 720, 1080): ",
        )?;
        match raw.parse::<u32>() {
            Ok(h) if h > 0 && h < crate::transcode::MAX_HEIGHT => return Ok(h),
            _ => println!(
                "Invalid input. Please enter a number between 1 and {}.",
                crate::transcode::MAX_HEIGHT - 1
            ),
        }
    }
}

/// Renders one cost figure the way every estimate display shows it.
fn format_figure(label: &str, figure: CostFigure) -> String {
    format!("{label}: {:.6} ETH (${:.2})", figure.native, figure.local)
}

pub fn print_figure(label: &str, figure: CostFigure) {
    println!("{}", format_figure(label, figure));
}

/// Shows per-profile estimates and asks the operator to pick one.
///
/// `base_price_wei` is the already-margined current price; for the capped
/// profile the ceiling is prompted for with the current price displayed, and
/// the estimate is re-projected at the ceiling.
pub fn select_profile(
    chunk_count: u32,
    base_price_wei: u128,
    native_price_local: f64,
) -> anyhow::Result<(PacingProfile, CostEstimate)> {
    let mut estimate = project_costs(chunk_count, base_price_wei, native_price_local, None);

    println!(
        "\nSelect a pacing profile for uploading {chunk_count} chunks (estimates can be inaccurate):"
    );
    print_figure("1. Instant", estimate.instant);
    print_figure("2. One chunk per minute", estimate.paced);
    println!(
        "3. Price ceiling: uploads only while the price is at or below your limit. This can be really slow.\n"
    );

    let choice = read_line("Enter your choice (1-3): ")?;
    let profile = match choice.as_str() {
        "1" => PacingProfile::Instant,
        "2" => PacingProfile::Paced,
        "3" => {
            println!(
                "Current price: {} gwei",
                chainvid_rpc::wei_to_gwei(base_price_wei)
            );
            let ceiling: f64 = read_line("Enter max price (in gwei): ")?
                .parse()
                .context("max price must be a number")?;
            estimate = project_costs(
                chunk_count,
                base_price_wei,
                native_price_local,
                Some(ceiling),
            );
            if let Some(figure) = estimate.capped {
                print_figure(&format!("Capped ({ceiling} gwei)"), figure);
            }
            PacingProfile::Capped {
                max_price_gwei: ceiling,
            }
        }
        _ => {
            println!("Invalid choice. Defaulting to the instant profile.");
            PacingProfile::Instant
        }
    };

    Ok((profile, estimate))
}

/// Final confirmation before any ledger write.
pub fn confirm_cost(profile: PacingProfile, estimate: &CostEstimate) -> anyhow::Result<bool> {
    println!("\nSelected profile:");
    if let Some(figure) = estimate.for_profile(profile) {
        print_figure(profile.label(), figure);
    }
    ask_yes("\nProceed with upload? (y/n): ")
}

/// Operator's answer to the resume prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeDecision {
    Resume,
    Decline,
    /// The staged chunk does not match what the ledger holds; resuming
    /// would desynchronize chunk ordering.
    Mismatch,
}

/// Confirms resumption of an interrupted upload.
///
/// A submission can land on the ledger without this process ever seeing the
/// confirmation, so before resuming the operator is shown the hex prefix of
/// the last checkpointed chunk and asked to verify it against the ledger.
pub fn confirm_resume(
    record: &ProgressRecord,
    chunks: &[Chunk],
) -> anyhow::Result<ResumeDecision> {
    println!("Found an incomplete upload for {}", record.filename);
    println!(
        "Progress: {}/{} chunks uploaded",
        record.next_chunk(),
        record.total_chunks
    );

    if !ask_yes("Do you want to resume this upload? (y/n): ")? {
        return Ok(ResumeDecision::Decline);
    }

    if let Some(last) = record.last_uploaded_chunk {
        let prefix = chainvid_chunks::hex_prefix(&chunks[last as usize].data, RESUME_PREFIX_LEN);
        println!("Latest uploaded chunk data starts with: {prefix}");
        if !ask_yes("Does this match the latest chunk uploaded on the ledger? (y/n): ")? {
            return Ok(ResumeDecision::Mismatch);
        }
    }

    Ok(ResumeDecision::Resume)
}
