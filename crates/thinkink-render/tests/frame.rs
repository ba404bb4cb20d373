//! Frames and exports produced from boards edited through the event API.

use kurbo::{Point, Size};
use thinkink_core::{ImagePlacement, PointerEvent, ToolKind, Whiteboard};
use thinkink_render::{
    DisplayList, DrawCommand, PngExportOptions, RenderContext, Renderer, SceneRenderer, export_png, export_svg,
};

fn drag(board: &mut Whiteboard, from: Point, to: Point) {
    board.handle_pointer(PointerEvent::down(from));
    board.handle_pointer(PointerEvent::moved(to));
    board.handle_pointer(PointerEvent::up(to));
}

fn frame(board: &Whiteboard, renderer: &mut SceneRenderer) -> DisplayList {
    let mut list = DisplayList::new();
    let ctx = RenderContext::new(board.store(), Size::new(800.0, 600.0));
    renderer.render(&ctx, &mut list);
    list
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
    let mut bytes = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

fn count(list: &DisplayList, pred: impl Fn(&DrawCommand) -> bool) -> usize {
    list.commands().iter().filter(|c| pred(c)).count()
}

#[test]
fn test_selection_adds_decorations() {
    let mut board = Whiteboard::new();
    board.set_tool(ToolKind::Rectangle);
    drag(&mut board, Point::new(10.0, 10.0), Point::new(110.0, 60.0));
    let mut renderer = SceneRenderer::new();

    let plain = frame(&board, &mut renderer);
    assert!(matches!(plain.commands().first(), Some(DrawCommand::Clear { .. })));

    board.set_tool(ToolKind::Select);
    board.handle_pointer(PointerEvent::down(Point::new(50.0, 30.0)));
    board.handle_pointer(PointerEvent::up(Point::new(50.0, 30.0)));
    let selected = frame(&board, &mut renderer);
    assert!(selected.len() > plain.len());
}

#[test]
fn test_in_progress_element_is_drawn_last() {
    let mut board = Whiteboard::new();
    board.set_tool(ToolKind::Rectangle);
    drag(&mut board, Point::new(0.0, 0.0), Point::new(40.0, 40.0));
    board.set_tool(ToolKind::Line);
    board.handle_pointer(PointerEvent::down(Point::new(100.0, 100.0)));
    board.handle_pointer(PointerEvent::moved(Point::new(200.0, 150.0)));

    let list = frame(&board, &mut SceneRenderer::new());
    assert!(matches!(list.commands().last(), Some(DrawCommand::Stroke { .. })));
    assert!(board.store().current().is_some());
}

#[test]
fn test_pasted_image_appears_after_decode() {
    let mut board = Whiteboard::new();
    board.queue_image(png_bytes(8, 6), ImagePlacement::Paste);
    assert!(board.tick(0));
    assert_eq!(board.elements().len(), 1);
    let image = &board.elements()[0];
    assert!((image.width - 8.0).abs() < f64::EPSILON);
    assert!((image.height - 6.0).abs() < f64::EPSILON);

    let mut renderer = SceneRenderer::new();
    let first = frame(&board, &mut renderer);
    assert_eq!(count(&first, |c| matches!(c, DrawCommand::Image { .. })), 0);

    assert!(renderer.process_pending());
    let second = frame(&board, &mut renderer);
    assert_eq!(count(&second, |c| matches!(c, DrawCommand::Image { .. })), 1);
}

#[test]
fn test_exports_ignore_viewport() {
    let mut board = Whiteboard::new();
    board.set_tool(ToolKind::Ellipse);
    drag(&mut board, Point::new(0.0, 0.0), Point::new(60.0, 40.0));
    board.set_tool(ToolKind::Pan);
    drag(&mut board, Point::new(0.0, 0.0), Point::new(300.0, 200.0));

    let svg = export_svg(board.elements()).unwrap();
    assert!(svg.contains(r#"viewBox="-20 -20 100 80""#));

    let png = export_png(board.elements(), &PngExportOptions::default()).unwrap();
    let decoded = image::load_from_memory(&png).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (100, 80));
}

#[test]
fn test_image_cache_settles_when_frame_needs_more_than_capacity() {
    let mut board = Whiteboard::new();
    board.queue_image(png_bytes(8, 6), ImagePlacement::Paste);
    board.queue_image(png_bytes(5, 5), ImagePlacement::Paste);
    assert!(board.tick(0));
    assert_eq!(board.elements().len(), 2);

    let mut renderer = SceneRenderer::with_cache_capacity(1);
    let pending: Vec<bool> = (0..5)
        .map(|_| {
            frame(&board, &mut renderer);
            renderer.process_pending()
        })
        .collect();
    assert_eq!(pending, vec![true, false, false, false, false]);

    let list = frame(&board, &mut renderer);
    assert_eq!(count(&list, |c| matches!(c, DrawCommand::Image { .. })), 2);
}
