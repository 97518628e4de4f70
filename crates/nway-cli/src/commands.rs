use std::fs;
use std::path::Path;

use anyhow::Context;
use colored::Colorize;

use nway_compute::DiffComputer;
use nway_engine::{DiffWorkspace, LineDiff};
use nway_types::{DiffOptions, LineNum, MemoryBuffer, SharedBuffer, TextBuffer};

use crate::cli::{Cli, Command, HunksArgs, OutputFormat, ShowArgs, TakeArgs};

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Show(args) => cmd_show(args),
        Command::Hunks(args) => cmd_hunks(args),
        Command::Take(args) => cmd_take(args),
    }
}

fn load_buffer(path: &Path) -> anyhow::Result<SharedBuffer> {
    let text =
        fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    Ok(MemoryBuffer::from_text(&text).into_shared())
}

fn parse_options(s: &str) -> anyhow::Result<DiffOptions> {
    s.parse()
        .with_context(|| format!("invalid diff options: {s}"))
}

fn cmd_show(args: ShowArgs) -> anyhow::Result<()> {
    let options = parse_options(&args.diffopt)?;
    let mut ws = DiffWorkspace::with_options(options);
    let mut buffers = Vec::new();
    for path in &args.files {
        let buf = load_buffer(path)?;
        ws.add_participant(buf.clone())?;
        buffers.push(buf);
    }
    ws.recompute()?;

    let headers: Vec<String> = args
        .files
        .iter()
        .map(|p| p.display().to_string())
        .collect();
    print!("{}", render_side_by_side(&mut ws, &buffers, &headers));
    Ok(())
}

/// One display row per column: a concrete line or a filler placeholder.
type Column = Vec<Option<LineNum>>;

fn layout_columns(ws: &mut DiffWorkspace, buffers: &[SharedBuffer]) -> Vec<Column> {
    let mut columns = Vec::new();
    for (slot, buf) in buffers.iter().enumerate() {
        let count = buf.lock().expect("buffer lock poisoned").line_count();
        let mut rows = Vec::new();
        for lnum in 1..=count {
            for _ in 0..ws.filler_above(slot, lnum) {
                rows.push(None);
            }
            rows.push(Some(lnum));
        }
        // Filler below the last line, for blocks ending at the document end.
        for _ in 0..ws.filler_above(slot, count + 1) {
            rows.push(None);
        }
        columns.push(rows);
    }
    columns
}

fn render_side_by_side(
    ws: &mut DiffWorkspace,
    buffers: &[SharedBuffer],
    headers: &[String],
) -> String {
    let columns = layout_columns(ws, buffers);
    let widths: Vec<usize> = buffers
        .iter()
        .enumerate()
        .map(|(slot, buf)| {
            let guard = buf.lock().expect("buffer lock poisoned");
            let longest = (1..=guard.line_count())
                .filter_map(|l| guard.line(l))
                .map(|l| l.chars().count())
                .max()
                .unwrap_or(0);
            longest.max(headers[slot].chars().count()).clamp(8, 40)
        })
        .collect();
    let height = columns.iter().map(|c| c.len()).max().unwrap_or(0);

    let mut out = String::new();
    for (slot, header) in headers.iter().enumerate() {
        if slot > 0 {
            out.push_str(" | ");
        }
        out.push_str(&format!("  {:width$}", header.bold(), width = widths[slot]));
    }
    out.push('\n');

    for row in 0..height {
        for slot in 0..buffers.len() {
            if slot > 0 {
                out.push_str(" | ");
            }
            let cell = match columns[slot].get(row) {
                Some(Some(lnum)) => render_line(ws, buffers, slot, *lnum, widths[slot]),
                Some(None) => format!("- {}", "-".repeat(widths[slot]).dimmed()),
                None => format!("  {}", " ".repeat(widths[slot])),
            };
            out.push_str(&cell);
        }
        out.push('\n');
    }
    out
}

fn render_line(
    ws: &mut DiffWorkspace,
    buffers: &[SharedBuffer],
    slot: usize,
    lnum: LineNum,
    width: usize,
) -> String {
    let text = buffers[slot]
        .lock()
        .expect("buffer lock poisoned")
        .line(lnum)
        .unwrap_or_default();
    let padding = " ".repeat(width.saturating_sub(text.chars().count()));
    match ws.classify(slot, lnum) {
        LineDiff::ChangedLine => {
            format!("{} {}{padding}", "|".yellow(), highlight_change(ws, slot, lnum, &text))
        }
        LineDiff::InsertedOrDeleted => format!("{} {}{padding}", "+".green(), text.green()),
        _ => format!("  {text}{padding}"),
    }
}

/// Color the changed span of a changed line, when the byte bounds fall on
/// character boundaries.
fn highlight_change(ws: &mut DiffWorkspace, slot: usize, lnum: LineNum, text: &str) -> String {
    if let Some((start, end)) = ws.find_change_bounds(slot, lnum).cols {
        let stop = (end + 1).min(text.len());
        if text.is_char_boundary(start) && text.is_char_boundary(stop) {
            return format!(
                "{}{}{}",
                &text[..start],
                text[start..stop].red().bold(),
                &text[stop..]
            );
        }
    }
    text.yellow().to_string()
}

fn cmd_hunks(args: HunksArgs) -> anyhow::Result<()> {
    let options = parse_options(&args.diffopt)?;
    let orig = read_lines(&args.a)?;
    let new = read_lines(&args.b)?;
    let outcome = DiffComputer::new().compute(&orig, &new, &options, false)?;

    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&outcome.hunks)?);
        }
        OutputFormat::Text => {
            if outcome.hunks.is_empty() {
                println!("files match");
            }
            for hunk in &outcome.hunks {
                println!(
                    "@@ -{},{} +{},{} @@",
                    hunk.orig_start, hunk.orig_count, hunk.new_start, hunk.new_count
                );
            }
        }
    }
    Ok(())
}

fn read_lines(path: &Path) -> anyhow::Result<Vec<String>> {
    let text =
        fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    Ok(MemoryBuffer::from_text(&text).as_lines().to_vec())
}

fn cmd_take(args: TakeArgs) -> anyhow::Result<()> {
    anyhow::ensure!(
        args.from_slot != args.to_slot,
        "source and target slot must differ"
    );
    let options = parse_options(&args.diffopt)?;
    let mut ws = DiffWorkspace::with_options(options);
    let buf_a = load_buffer(&args.a)?;
    let buf_b = load_buffer(&args.b)?;
    ws.add_participant(buf_a.clone())?;
    ws.add_participant(buf_b.clone())?;
    ws.recompute()?;

    let target = if args.to_slot == 0 { &buf_a } else { &buf_b };
    let (line1, line2) = match &args.range {
        Some(range) => parse_range(range)?,
        None => (1, target.lock().expect("buffer lock poisoned").line_count()),
    };
    ws.take(Some(args.from_slot), Some(args.to_slot), line1, line2)?;

    print!("{}", target.lock().expect("buffer lock poisoned").text());
    Ok(())
}

fn parse_range(s: &str) -> anyhow::Result<(LineNum, LineNum)> {
    let (first, last) = s.split_once(':').context("range must look like L1:L2")?;
    let line1: LineNum = first.trim().parse().context("invalid range start")?;
    let line2: LineNum = last.trim().parse().context("invalid range end")?;
    anyhow::ensure!(line1 >= 1 && line2 >= line1, "range must be ascending and 1-based");
    Ok((line1, line2))
}
