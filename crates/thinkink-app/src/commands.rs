//! Command execution.

use crate::cli::{Cli, Command, USAGE};
use crate::AppError;
use kurbo::Rect;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thinkink_core::geometry::union_bounds;
use thinkink_core::storage::{AutoSaveManager, FileStorage};
use thinkink_core::{Document, Settings, Whiteboard, export_to_json};
use thinkink_render::{PngExportOptions, SceneRenderer, Theme, export_svg, load_font, render_elements};

/// Run a parsed command line.
pub fn run(cli: Cli) -> Result<(), AppError> {
    let settings = cli.config.as_deref().map(Settings::load).unwrap_or_default();

    match cli.command {
        Command::Help => println!("{}", USAGE),
        Command::ExportPng {
            input,
            output,
            scale,
            dark,
            font,
        } => {
            let document = read_document(&input)?;
            let options = PngExportOptions {
                scale,
                theme: if dark { Theme::Dark } else { Theme::Light },
                font: font.as_deref().map(load_font).transpose()?,
            };
            let mut renderer = SceneRenderer::with_cache_capacity(settings.image_cache_capacity);
            let surface = render_elements(&document.elements, &options, &mut renderer)?;
            write_file(&output, &surface.encode_png()?)?;
            println!("Wrote {}x{} PNG to {}", surface.width(), surface.height(), output.display());
        }
        Command::ExportSvg { input, output } => {
            let document = read_document(&input)?;
            write_file(&output, export_svg(&document.elements)?.as_bytes())?;
            println!("Wrote SVG to {}", output.display());
        }
        Command::Info { input } => {
            let document = read_document(&input)?;
            print!("{}", BoardInfo::from_document(&document));
        }
        Command::Save { input } => {
            let document = read_document(&input)?;
            let mut autosave = autosave(cli.data_dir, &settings)?;
            pollster::block_on(autosave.save(&document.elements))?;
            println!(
                "Saved {} elements to {}",
                document.elements.len(),
                autosave.storage().base_path().display()
            );
        }
        Command::Restore { output } => {
            let mut autosave = autosave(cli.data_dir, &settings)?;
            let mut board = Whiteboard::with_settings(settings);
            if !pollster::block_on(autosave.hydrate(board.store_mut())) {
                return Err(AppError::NothingSaved);
            }
            write_file(&output, export_to_json(board.elements()).as_bytes())?;
            println!("Restored {} elements to {}", board.elements().len(), output.display());
        }
    }
    Ok(())
}

fn autosave(data_dir: Option<PathBuf>, settings: &Settings) -> Result<AutoSaveManager<FileStorage>, AppError> {
    let storage = match data_dir {
        Some(dir) => FileStorage::new(dir)?,
        None => FileStorage::default_location()?,
    };
    Ok(AutoSaveManager::new(Arc::new(storage))
        .with_interval(Duration::from_secs(settings.autosave_interval_secs)))
}

fn read_document(path: &Path) -> Result<Document, AppError> {
    let json = std::fs::read_to_string(path).map_err(|source| AppError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let document = Document::from_json(&json)?;
    log::info!("Loaded {} elements from {}", document.elements.len(), path.display());
    Ok(document)
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), AppError> {
    std::fs::write(path, bytes).map_err(|source| AppError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Summary printed by `info`.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardInfo {
    pub version: u32,
    pub element_count: usize,
    pub kinds: BTreeMap<&'static str, usize>,
    pub bounds: Option<Rect>,
}

impl BoardInfo {
    pub fn from_document(document: &Document) -> Self {
        let mut kinds = BTreeMap::new();
        for element in &document.elements {
            *kinds.entry(element.kind.name()).or_insert(0) += 1;
        }
        Self {
            version: document.version,
            element_count: document.elements.len(),
            kinds,
            bounds: union_bounds(&document.elements),
        }
    }
}

impl fmt::Display for BoardInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "version: {}", self.version)?;
        writeln!(f, "elements: {}", self.element_count)?;
        for (kind, count) in &self.kinds {
            writeln!(f, "  {}: {}", kind, count)?;
        }
        match self.bounds {
            Some(b) => writeln!(
                f,
                "bounds: ({:.1}, {:.1}) {:.1} x {:.1}",
                b.x0,
                b.y0,
                b.width(),
                b.height()
            ),
            None => writeln!(f, "bounds: none"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;
    use thinkink_core::{Element, ElementStyle};

    fn board_file(dir: &Path) -> PathBuf {
        let elements = vec![
            Element::rectangle(Point::new(10.0, 10.0), 100.0, 50.0, ElementStyle::default()),
            Element::rectangle(Point::new(200.0, 10.0), 20.0, 20.0, ElementStyle::default()),
            Element::line(Point::new(0.0, 0.0), Point::new(50.0, 50.0), ElementStyle::default()),
        ];
        let path = dir.join("board.json");
        std::fs::write(&path, export_to_json(&elements)).unwrap();
        path
    }

    fn cli(command: Command, data_dir: Option<PathBuf>) -> Cli {
        Cli {
            config: None,
            data_dir,
            command,
        }
    }

    #[test]
    fn test_board_info() {
        let dir = tempfile::tempdir().unwrap();
        let document = read_document(&board_file(dir.path())).unwrap();
        let info = BoardInfo::from_document(&document);
        assert_eq!(info.element_count, 3);
        assert_eq!(info.kinds.get("rectangle"), Some(&2));
        assert_eq!(info.kinds.get("line"), Some(&1));
        assert_eq!(info.bounds, Some(Rect::new(0.0, 0.0, 220.0, 60.0)));
        assert!(info.to_string().contains("elements: 3"));
    }

    #[test]
    fn test_export_svg_and_png() {
        let dir = tempfile::tempdir().unwrap();
        let input = board_file(dir.path());
        let svg = dir.path().join("out.svg");
        let png = dir.path().join("out.png");

        run(cli(
            Command::ExportSvg {
                input: input.clone(),
                output: svg.clone(),
            },
            None,
        ))
        .unwrap();
        run(cli(
            Command::ExportPng {
                input,
                output: png.clone(),
                scale: 0.5,
                dark: false,
                font: None,
            },
            None,
        ))
        .unwrap();

        assert!(std::fs::read_to_string(svg).unwrap().starts_with("<svg"));
        let image = image::open(png).unwrap();
        assert_eq!((image.width(), image.height()), (130, 50));
    }

    #[test]
    fn test_save_then_restore() {
        let dir = tempfile::tempdir().unwrap();
        let input = board_file(dir.path());
        let data = dir.path().join("data");
        let output = dir.path().join("restored.json");

        run(cli(Command::Save { input: input.clone() }, Some(data.clone()))).unwrap();
        run(cli(Command::Restore { output: output.clone() }, Some(data))).unwrap();

        let original = read_document(&input).unwrap();
        let restored = read_document(&output).unwrap();
        assert_eq!(original.elements, restored.elements);
    }

    #[test]
    fn test_restore_without_save() {
        let dir = tempfile::tempdir().unwrap();
        let result = run(cli(
            Command::Restore {
                output: dir.path().join("out.json"),
            },
            Some(dir.path().join("empty")),
        ));
        assert!(matches!(result, Err(AppError::NothingSaved)));
    }

    #[test]
    fn test_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let result = run(cli(
            Command::Info {
                input: dir.path().join("missing.json"),
            },
            None,
        ));
        assert!(matches!(result, Err(AppError::Read { .. })));
    }
}
