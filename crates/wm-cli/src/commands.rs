//! Subcommand implementations.

use crate::CliError;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Instant, UNIX_EPOCH};
use wm_core::codec::{self, decode_limited};
use wm_core::{EditorConfig, LayerId, PixelGrid, Point, Waypoint};
use wm_editor::{LinearPlanner, MapEditor, MapSource, MemoryStore};
use wm_render::CanvasTheme;

pub struct RenderJob {
    pub file: PathBuf,
    pub output: PathBuf,
    pub waypoints: Vec<Waypoint>,
    pub plan: bool,
    pub grid: bool,
    pub hide: Vec<String>,
    pub dark: bool,
}

fn read(path: &Path) -> Result<Vec<u8>, CliError> {
    fs::read(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_config(path: Option<&Path>) -> Result<EditorConfig, CliError> {
    let Some(path) = path else {
        return Ok(EditorConfig::default());
    };
    let text = fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = EditorConfig::from_json_str(&text)?;
    log::debug!("config loaded from {}", path.display());
    Ok(config)
}

/// Parse `x,y` or `x,y,theta`.
pub fn parse_waypoint(s: &str) -> Result<Waypoint, String> {
    let fields = s
        .split(',')
        .map(|f| f.trim().parse::<f64>().map_err(|e| format!("{f:?}: {e}")))
        .collect::<Result<Vec<_>, _>>()?;
    let wp = match fields.as_slice() {
        [x, y] => Waypoint::new(*x, *y, 0.0),
        [x, y, theta] => Waypoint::new(*x, *y, *theta),
        _ => return Err(format!("expected X,Y or X,Y,THETA, got {s:?}")),
    };
    if [wp.x, wp.y, wp.theta].iter().all(|v| v.is_finite()) {
        Ok(wp)
    } else {
        Err(format!("non-finite coordinate in {s:?}"))
    }
}

// ─── info ────────────────────────────────────────────────────────────────

struct Stats {
    min: u8,
    max: u8,
    mean: f64,
}

fn stats(grid: &PixelGrid) -> Stats {
    let samples = grid.samples();
    let (min, max, sum) = samples
        .iter()
        .fold((u8::MAX, u8::MIN, 0u64), |(lo, hi, sum), &v| (lo.min(v), hi.max(v), sum + u64::from(v)));
    Stats {
        min,
        max,
        mean: sum as f64 / samples.len() as f64,
    }
}

pub fn info(file: &Path, config: &EditorConfig, json: bool) -> Result<(), CliError> {
    let bytes = read(file)?;
    let grid = decode_limited(&bytes, config.max_file_bytes)?;
    let s = stats(&grid);
    if json {
        let value = serde_json::json!({
            "file": file.display().to_string(),
            "bytes": bytes.len(),
            "width": grid.width(),
            "height": grid.height(),
            "maxval": grid.max_val(),
            "min": s.min,
            "max": s.max,
            "mean": s.mean,
        });
        println!("{value:#}");
    } else {
        println!("{}", file.display());
        println!("  size    {}x{}", grid.width(), grid.height());
        println!("  maxval  {}", grid.max_val());
        println!("  samples min {} max {} mean {:.2}", s.min, s.max, s.mean);
    }
    Ok(())
}

// ─── render ──────────────────────────────────────────────────────────────

fn source_for(path: &Path) -> Result<MapSource, CliError> {
    let file = read(path)?;
    let last_modified = fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |d| d.as_millis() as u64);
    let file_name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
    Ok(MapSource {
        file,
        file_name,
        last_modified,
    })
}

pub fn render(config: EditorConfig, job: &RenderJob) -> Result<(), CliError> {
    let theme = if job.dark { CanvasTheme::dark() } else { CanvasTheme::light() };
    let planner = LinearPlanner::new(config.planner_steps);
    let mut editor = MapEditor::new(config, MemoryStore::new(), planner).with_theme(theme);

    editor.load(source_for(&job.file)?, Instant::now())?;
    // the composite is image-sized; grid spacing should be in image pixels
    editor.zoom_to(1.0, Point::ZERO);

    for &wp in &job.waypoints {
        editor.add_waypoint(wp);
    }
    if job.plan {
        let points = editor.plan_path()?;
        log::info!("planned {points} path points");
    }
    if job.grid {
        editor.set_layer_visible(LayerId::grid(), true)?;
    }
    for name in &job.hide {
        editor.set_layer_visible(LayerId::intern(name), false)?;
    }

    let out = editor.composite_now().ok_or(CliError::Empty)?.to_gray_grid()?;
    fs::write(&job.output, codec::encode(&out)).map_err(|source| CliError::Io {
        path: job.output.clone(),
        source,
    })?;
    log::info!("wrote {} ({}x{})", job.output.display(), out.width(), out.height());
    Ok(())
}
