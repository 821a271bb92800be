// src/display/terminal.rs
//! Terminal readout of the viewport and tile cache

use super::ViewSnapshot;
use crate::error::Result;
use chrono::Utc;
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, Clear, ClearType, DisableLineWrap, EnableLineWrap},
};
use std::io::{self, Write};

// raw mode needs explicit carriage returns
const NL: &str = "\r\n";

pub struct TerminalDisplay;

impl TerminalDisplay {
    pub fn new() -> Self {
        Self
    }

    /// Take over the terminal: raw keyboard input, hidden cursor
    pub fn enter(&self) -> Result<()> {
        terminal::enable_raw_mode()?;
        execute!(io::stdout(), Hide, DisableLineWrap)?;
        Ok(())
    }

    pub fn leave(&self) -> Result<()> {
        execute!(io::stdout(), Show, EnableLineWrap)?;
        terminal::disable_raw_mode()?;
        println!("\nShutting down...");
        Ok(())
    }

    /// Redraw the whole screen from a snapshot
    pub fn draw(&self, snapshot: &ViewSnapshot) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(stdout, Clear(ClearType::All), MoveTo(0, 0))?;
        self.render_display(&mut stdout, snapshot)?;
        stdout.flush()?;
        Ok(())
    }

    fn render_display(&self, stdout: &mut impl Write, snapshot: &ViewSnapshot) -> Result<()> {
        execute!(
            stdout,
            SetForegroundColor(Color::Green),
            Print("=".repeat(60)),
            Print(NL),
            Print("Map Viewport - Tile Cache Monitor"),
            Print(NL),
            Print("=".repeat(60)),
            Print(NL),
            ResetColor
        )?;

        execute!(
            stdout,
            Print(format!(
                "Last Update: {} (frame {}){}{}",
                Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
                snapshot.frame_id,
                NL,
                NL
            ))
        )?;

        self.render_view_section(stdout, snapshot)?;
        self.render_tiles_section(stdout, snapshot)?;
        self.render_cache_section(stdout, snapshot)?;

        execute!(
            stdout,
            SetForegroundColor(Color::Green),
            Print("=".repeat(60)),
            Print(NL),
            Print("Arrows: pan  +/-: zoom  q/e: rotate  w: world copies  c: clear  Esc: quit"),
            Print(NL),
            ResetColor
        )?;

        Ok(())
    }

    fn render_view_section(&self, stdout: &mut impl Write, snapshot: &ViewSnapshot) -> Result<()> {
        execute!(
            stdout,
            SetForegroundColor(Color::Yellow),
            Print(format!("VIEW:{}", NL)),
            ResetColor,
            Print(format!("  Center:    {:.6}°, {:.6}°{}", snapshot.center_lng, snapshot.center_lat, NL)),
            Print(format!("  Zoom:      {:.2}{}", snapshot.zoom, NL)),
            Print(format!("  Bearing:   {:.1}°{}", snapshot.bearing, NL)),
            Print(format!(
                "  Copies:    {}{}{}",
                if snapshot.world_copies { "on" } else { "off" },
                NL,
                NL
            ))
        )?;
        Ok(())
    }

    fn render_tiles_section(&self, stdout: &mut impl Write, snapshot: &ViewSnapshot) -> Result<()> {
        let (tile_x, tile_y) = snapshot.center_tile;
        execute!(
            stdout,
            SetForegroundColor(Color::Cyan),
            Print(format!("TILES:{}", NL)),
            ResetColor,
            Print(format!("  Level:     {} (center tile {}/{}/{}){}", snapshot.tile_zoom, snapshot.tile_zoom, tile_x, tile_y, NL)),
            Print(format!("  Visible:   {}{}", snapshot.visible, NL)),
            Print(format!("  Drawn:     {}{}{}", snapshot.drawn, NL, NL))
        )?;
        Ok(())
    }

    fn render_cache_section(&self, stdout: &mut impl Write, snapshot: &ViewSnapshot) -> Result<()> {
        let stats = &snapshot.stats;
        execute!(
            stdout,
            SetForegroundColor(Color::Magenta),
            Print(format!("CACHE:{}", NL)),
            ResetColor,
            Print(format!("  Resident:  {} / {}{}", stats.resident, snapshot.max_cache, NL)),
            Print(format!(
                "  States:    {} ready, {} loading, {} queued, {} error{}",
                stats.ready, stats.loading, stats.queued, stats.errored, NL
            )),
            Print(format!("  In flight: {} / {} ({} waiting){}", stats.in_flight, snapshot.max_parallel, stats.queue_len, NL)),
            Print(format!(
                "  Evicted:   {} this frame, {} total{}",
                stats.evicted_last_frame, stats.evicted_total, NL
            )),
            Print(format!(
                "  Fetches:   {} started, {} failed, {} stale{}{}",
                stats.fetches_started, stats.fetch_failures, stats.stale_completions, NL, NL
            ))
        )?;
        Ok(())
    }
}

impl Default for TerminalDisplay {
    fn default() -> Self {
        Self::new()
    }
}
