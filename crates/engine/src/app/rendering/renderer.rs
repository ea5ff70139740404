use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::ImageReader;
use pixels::{Error, Pixels, SurfaceTexture};
use tracing::warn;
use winit::window::Window;

use crate::app::{HudFrame, MenuPanel, MotionClip, Renderable, SceneWorld, Tilemap, Vec2};

use super::text::{draw_text, measure_text, LINE_ADVANCE};
use super::{world_to_screen, Viewport};

const CLEAR_COLOR: [u8; 4] = [16, 18, 24, 255];
const HEALTH_BAR_BG_COLOR: [u8; 4] = [100, 0, 0, 255];
const HEALTH_BAR_FILL_COLOR: [u8; 4] = [0, 255, 0, 255];
const HEALTH_BAR_MIN_WIDTH: i32 = 30;
const HEALTH_BAR_GAP_PX: i32 = 4;
const PANEL_BG_COLOR: [u8; 4] = [10, 12, 16, 255];
const PANEL_BORDER_COLOR: [u8; 4] = [92, 106, 126, 255];
const PANEL_INSET: i32 = 8;
const PANEL_MARGIN: i32 = 12;
const HUD_TEXT_COLOR: [u8; 4] = [244, 248, 252, 255];
const LOG_TEXT_COLOR: [u8; 4] = [176, 198, 220, 255];
const MENU_SELECTED_COLOR: [u8; 4] = [255, 220, 120, 255];

struct LoadedSprite {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
    asset_root: PathBuf,
    sprite_cache: HashMap<String, Option<LoadedSprite>>,
    warned_missing_sprite_keys: HashSet<String>,
    draw_order: Vec<usize>,
}

impl Renderer {
    pub fn new(window: Arc<Window>, asset_root: PathBuf) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width.max(1), size.height.max(1))?;
        Ok(Self {
            window,
            pixels,
            viewport: Viewport {
                width: size.width,
                height: size.height,
            },
            asset_root,
            sprite_cache: HashMap::new(),
            warned_missing_sprite_keys: HashSet::new(),
            draw_order: Vec::new(),
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.viewport = Viewport { width, height };
        Ok(())
    }

    fn build_pixels(window: Arc<Window>, width: u32, height: u32) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    pub(crate) fn render(
        &mut self,
        world: &SceneWorld,
        hud: Option<&HudFrame>,
    ) -> Result<(), Error> {
        let viewport = self.viewport;
        if viewport.width == 0 || viewport.height == 0 {
            return Ok(());
        }

        let frame = self.pixels.frame_mut();
        for chunk in frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&CLEAR_COLOR);
        }

        if let Some(tilemap) = world.tilemap() {
            draw_tilemap(frame, viewport, world, tilemap);
        }

        self.draw_order.clear();
        self.draw_order.extend(0..world.entities().len());
        let entities = world.entities();
        self.draw_order
            .sort_by_key(|index| (entities[*index].layer, entities[*index].id));

        for index in self.draw_order.iter().copied() {
            let entity = &entities[index];
            let (left, top) = world_to_screen(entity.position, world.camera(), viewport);
            let w = entity.size.x.round() as i32;
            let h = entity.size.y.round() as i32;
            if left + w < 0
                || top + h < 0
                || left >= viewport.width as i32
                || top >= viewport.height as i32
            {
                continue;
            }

            match &entity.renderable {
                Renderable::ColorRect { color } => {
                    let color = tint_for_clip(*color, entity.visual.clip);
                    draw_filled_rect(frame, viewport, left, top, w, h, color);
                }
                Renderable::Sprite { key, fallback } => {
                    let sprite = resolve_cached_sprite(
                        &mut self.sprite_cache,
                        &mut self.warned_missing_sprite_keys,
                        &self.asset_root,
                        key,
                    );
                    if let Some(sprite) = sprite {
                        draw_sprite_scaled(frame, viewport, left, top, w, h, sprite);
                    } else {
                        let color = tint_for_clip(*fallback, entity.visual.clip);
                        draw_filled_rect(frame, viewport, left, top, w, h, color);
                    }
                }
            }

            if let Some(fraction) = entity.visual.health_fraction {
                if fraction < 1.0 {
                    draw_health_bar(frame, viewport, left, top, w, fraction);
                }
            }
        }

        if let Some(hud) = hud {
            draw_hud(frame, viewport, hud);
        }

        self.pixels.render()
    }
}

fn tint_for_clip(color: [u8; 4], clip: MotionClip) -> [u8; 4] {
    match clip {
        MotionClip::Corpse => [color[0] / 3, color[1] / 3, color[2] / 3, color[3]],
        MotionClip::Death => [color[0] / 2, color[1] / 2, color[2] / 2, color[3]],
        MotionClip::Attack => [
            color[0].saturating_add(60),
            color[1].saturating_add(60),
            color[2].saturating_add(60),
            color[3],
        ],
        MotionClip::Hurt => [
            color[0].saturating_add(80),
            color[1] / 2,
            color[2] / 2,
            color[3],
        ],
        MotionClip::Idle | MotionClip::Walk => color,
    }
}

fn draw_tilemap(frame: &mut [u8], viewport: Viewport, world: &SceneWorld, tilemap: &Tilemap) {
    let tile = tilemap.tile_size_px() as i32;
    if tile <= 0 {
        return;
    }
    let camera = world.camera();
    let view_left = camera.position.x - viewport.width as f32 * 0.5;
    let view_top = camera.position.y - viewport.height as f32 * 0.5;

    let first_x = (view_left / tile as f32).floor().max(0.0) as u32;
    let first_y = (view_top / tile as f32).floor().max(0.0) as u32;
    let last_x = (((view_left + viewport.width as f32) / tile as f32).ceil() as i64)
        .clamp(0, tilemap.width() as i64) as u32;
    let last_y = (((view_top + viewport.height as f32) / tile as f32).ceil() as i64)
        .clamp(0, tilemap.height() as i64) as u32;

    for tile_y in first_y..last_y {
        for tile_x in first_x..last_x {
            let Some(color) = tilemap.color_at(tile_x, tile_y) else {
                continue;
            };
            let world_pos = Vec2 {
                x: (tile_x as i64 * tile as i64) as f32,
                y: (tile_y as i64 * tile as i64) as f32,
            };
            let (left, top) = world_to_screen(world_pos, camera, viewport);
            draw_filled_rect(frame, viewport, left, top, tile, tile, color);
        }
    }
}

fn draw_health_bar(
    frame: &mut [u8],
    viewport: Viewport,
    entity_left: i32,
    entity_top: i32,
    entity_width: i32,
    fraction: f32,
) {
    let bar_width = entity_width.max(HEALTH_BAR_MIN_WIDTH);
    let bar_height = if entity_width > 32 { 6 } else { 4 };
    let bar_left = entity_left + (entity_width - bar_width) / 2;
    let bar_top = entity_top - bar_height - HEALTH_BAR_GAP_PX;
    let fill_width = (bar_width as f32 * fraction.clamp(0.0, 1.0)).round() as i32;

    draw_filled_rect(
        frame,
        viewport,
        bar_left,
        bar_top,
        bar_width,
        bar_height,
        HEALTH_BAR_BG_COLOR,
    );
    draw_filled_rect(
        frame,
        viewport,
        bar_left,
        bar_top,
        fill_width,
        bar_height,
        HEALTH_BAR_FILL_COLOR,
    );
}

fn draw_hud(frame: &mut [u8], viewport: Viewport, hud: &HudFrame) {
    if !hud.lines.is_empty() {
        draw_text_panel(frame, viewport, PANEL_MARGIN, PANEL_MARGIN, &hud.lines, None);
    }

    if !hud.log.is_empty() {
        let log_height = hud.log.len() as i32 * LINE_ADVANCE;
        let mut y = viewport.height as i32 - PANEL_MARGIN - log_height;
        for line in &hud.log {
            draw_text(
                frame,
                viewport.width,
                viewport.height,
                PANEL_MARGIN,
                y,
                line,
                LOG_TEXT_COLOR,
            );
            y += LINE_ADVANCE;
        }
    }

    if let Some(menu) = &hud.menu {
        draw_menu_panel(frame, viewport, menu);
    }
}

fn draw_text_panel(
    frame: &mut [u8],
    viewport: Viewport,
    left: i32,
    top: i32,
    lines: &[String],
    selected: Option<usize>,
) {
    let longest = lines.iter().map(|line| measure_text(line)).max().unwrap_or(0);
    let panel_width = longest + PANEL_INSET * 2;
    let panel_height = lines.len() as i32 * LINE_ADVANCE + PANEL_INSET * 2;

    draw_filled_rect(
        frame,
        viewport,
        left,
        top,
        panel_width,
        panel_height,
        PANEL_BG_COLOR,
    );
    draw_rect_outline(
        frame,
        viewport,
        left,
        top,
        panel_width,
        panel_height,
        PANEL_BORDER_COLOR,
    );

    let mut y = top + PANEL_INSET;
    for (index, line) in lines.iter().enumerate() {
        let color = if selected == Some(index) {
            MENU_SELECTED_COLOR
        } else {
            HUD_TEXT_COLOR
        };
        draw_text(
            frame,
            viewport.width,
            viewport.height,
            left + PANEL_INSET,
            y,
            line,
            color,
        );
        y += LINE_ADVANCE;
    }
}

fn draw_menu_panel(frame: &mut [u8], viewport: Viewport, menu: &MenuPanel) {
    let mut lines = Vec::with_capacity(menu.entries.len() + 2);
    lines.push(menu.title.clone());
    lines.push(String::new());
    for (index, entry) in menu.entries.iter().enumerate() {
        if index == menu.selected {
            lines.push(format!("> {entry}"));
        } else {
            lines.push(format!("  {entry}"));
        }
    }

    let longest = lines.iter().map(|line| measure_text(line)).max().unwrap_or(0);
    let panel_width = longest + PANEL_INSET * 2;
    let panel_height = lines.len() as i32 * LINE_ADVANCE + PANEL_INSET * 2;
    let left = (viewport.width as i32 - panel_width) / 2;
    let top = (viewport.height as i32 - panel_height) / 2;

    let selected_line = menu.selected + 2;
    draw_text_panel(frame, viewport, left, top, &lines, Some(selected_line));
}

fn draw_filled_rect(
    frame: &mut [u8],
    viewport: Viewport,
    left: i32,
    top: i32,
    w: i32,
    h: i32,
    color: [u8; 4],
) {
    if w <= 0 || h <= 0 {
        return;
    }
    let right = left + w;
    let bottom = top + h;
    let clip_left = left.max(0);
    let clip_top = top.max(0);
    let clip_right = right.min(viewport.width as i32);
    let clip_bottom = bottom.min(viewport.height as i32);

    for y in clip_top..clip_bottom {
        for x in clip_left..clip_right {
            write_pixel(frame, viewport.width as usize, x as usize, y as usize, color);
        }
    }
}

fn draw_rect_outline(
    frame: &mut [u8],
    viewport: Viewport,
    left: i32,
    top: i32,
    w: i32,
    h: i32,
    color: [u8; 4],
) {
    if w <= 0 || h <= 0 {
        return;
    }
    draw_filled_rect(frame, viewport, left, top, w, 1, color);
    draw_filled_rect(frame, viewport, left, top + h - 1, w, 1, color);
    draw_filled_rect(frame, viewport, left, top, 1, h, color);
    draw_filled_rect(frame, viewport, left + w - 1, top, 1, h, color);
}

fn write_pixel(frame: &mut [u8], width: usize, x: usize, y: usize, color: [u8; 4]) {
    let Some(pixel_offset) = y.checked_mul(width).and_then(|row| row.checked_add(x)) else {
        return;
    };
    let Some(byte_offset) = pixel_offset.checked_mul(4) else {
        return;
    };
    let Some(end) = byte_offset.checked_add(4) else {
        return;
    };
    if end > frame.len() {
        return;
    }
    frame[byte_offset..end].copy_from_slice(&color);
}

fn draw_sprite_scaled(
    frame: &mut [u8],
    viewport: Viewport,
    left: i32,
    top: i32,
    target_w: i32,
    target_h: i32,
    sprite: &LoadedSprite,
) {
    if sprite.width == 0 || sprite.height == 0 || target_w <= 0 || target_h <= 0 {
        return;
    }
    let expected_len = sprite.width as usize * sprite.height as usize * 4;
    if sprite.rgba.len() < expected_len {
        return;
    }

    let clip_left = left.max(0);
    let clip_top = top.max(0);
    let clip_right = (left + target_w).min(viewport.width as i32);
    let clip_bottom = (top + target_h).min(viewport.height as i32);
    if clip_left >= clip_right || clip_top >= clip_bottom {
        return;
    }

    let x_step = sprite.width as f32 / target_w as f32;
    let y_step = sprite.height as f32 / target_h as f32;
    let sprite_width = sprite.width as usize;

    for out_y in clip_top..clip_bottom {
        let src_y = (((out_y - top) as f32) * y_step).floor() as u32;
        let src_y = src_y.min(sprite.height - 1) as usize;
        let src_row_offset = src_y * sprite_width * 4;

        for out_x in clip_left..clip_right {
            let src_x = (((out_x - left) as f32) * x_step).floor() as u32;
            let src_x = src_x.min(sprite.width - 1) as usize;
            let src_offset = src_row_offset + src_x * 4;
            let alpha = sprite.rgba[src_offset + 3];
            if alpha == 0 {
                continue;
            }
            write_pixel(
                frame,
                viewport.width as usize,
                out_x as usize,
                out_y as usize,
                [
                    sprite.rgba[src_offset],
                    sprite.rgba[src_offset + 1],
                    sprite.rgba[src_offset + 2],
                    alpha,
                ],
            );
        }
    }
}

fn resolve_cached_sprite<'a>(
    cache: &'a mut HashMap<String, Option<LoadedSprite>>,
    warned_missing_sprite_keys: &mut HashSet<String>,
    asset_root: &Path,
    key: &str,
) -> Option<&'a LoadedSprite> {
    if !cache.contains_key(key) {
        let path = asset_root.join("sprites").join(format!("{key}.png"));
        let sprite = match load_sprite_rgba(&path) {
            Ok(sprite) => Some(sprite),
            Err(reason) => {
                warn_sprite_load_once(warned_missing_sprite_keys, key, &path, reason.as_str());
                None
            }
        };
        cache.insert(key.to_string(), sprite);
    }
    cache.get(key).and_then(Option::as_ref)
}

fn load_sprite_rgba(path: &Path) -> Result<LoadedSprite, String> {
    let reader = ImageReader::open(path).map_err(|error| format!("file_open_failed:{error}"))?;
    let decoded = reader
        .decode()
        .map_err(|error| format!("decode_failed:{error}"))?;
    let image = decoded.to_rgba8();
    Ok(LoadedSprite {
        width: image.width(),
        height: image.height(),
        rgba: image.into_raw(),
    })
}

fn warn_sprite_load_once(
    warned_keys: &mut HashSet<String>,
    key: &str,
    resolved_path: &Path,
    reason: &str,
) {
    if !warned_keys.insert(key.to_string()) {
        return;
    }
    warn!(
        sprite_key = key,
        path = %resolved_path.display(),
        reason = reason,
        "sprite_load_failed_using_fallback_color"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_frame(viewport: Viewport) -> Vec<u8> {
        vec![0u8; viewport.width as usize * viewport.height as usize * 4]
    }

    #[test]
    fn filled_rect_clips_to_frame() {
        let viewport = Viewport {
            width: 8,
            height: 8,
        };
        let mut frame = blank_frame(viewport);
        draw_filled_rect(&mut frame, viewport, -4, -4, 8, 8, [255, 0, 0, 255]);

        // Only the visible quadrant was written.
        assert_eq!(frame[0..4], [255, 0, 0, 255]);
        let outside = (5 * 8 + 5) * 4;
        assert_eq!(frame[outside..outside + 4], [0, 0, 0, 0]);
    }

    #[test]
    fn corpse_tint_is_darker_than_base() {
        let base = [120, 90, 60, 255];
        let corpse = tint_for_clip(base, MotionClip::Corpse);
        assert!(corpse[0] < base[0] && corpse[1] < base[1] && corpse[2] < base[2]);
        assert_eq!(corpse[3], base[3]);
    }

    #[test]
    fn attack_tint_brightens_without_overflow() {
        let tinted = tint_for_clip([250, 250, 250, 255], MotionClip::Attack);
        assert_eq!(tinted, [255, 255, 255, 255]);
    }

    #[test]
    fn health_bar_uses_minimum_width_for_small_entities() {
        let viewport = Viewport {
            width: 64,
            height: 64,
        };
        let mut frame = blank_frame(viewport);
        draw_health_bar(&mut frame, viewport, 20, 20, 16, 0.5);

        // The background spans the 30 px minimum, centered over the entity.
        let bar_left = 20 + (16 - HEALTH_BAR_MIN_WIDTH) / 2;
        let bar_top = 20 - 4 - HEALTH_BAR_GAP_PX;
        let offset = (bar_top as usize * 64 + (bar_left + HEALTH_BAR_MIN_WIDTH - 1) as usize) * 4;
        assert_eq!(frame[offset..offset + 4], HEALTH_BAR_BG_COLOR);
    }
}
