use checkers_engine::{AdvisoryView, Color, Game, MATE};
use eframe::egui::{Align2, Color32, FontId, Pos2, Rect, Sense, Stroke, Ui, Vec2};

const LIGHT_SQUARE: Color32 = Color32::from_rgb(0xF0, 0xD9, 0xB5);
const DARK_SQUARE: Color32 = Color32::from_rgb(0xB5, 0x88, 0x63);
const SELECTED_SQUARE: Color32 = Color32::from_rgb(0x64, 0x6F, 0x40);
const HINT_COLOR: Color32 = Color32::from_rgb(0x20, 0x50, 0xE0);
const DESTINATION_FILL: Color32 = Color32::from_rgb(0x90, 0xEE, 0x90);
const DESTINATION_RING: Color32 = Color32::from_rgb(0x00, 0x80, 0x00);
// The light side is drawn red, as on the physical board this mimics.
const WHITE_DISC: Color32 = Color32::from_rgb(0xC8, 0x1E, 0x1E);
const BLACK_DISC: Color32 = Color32::BLACK;
const KING_RING: Color32 = Color32::GOLD;

/** Mate-aware score line: distances to the forced end, otherwise raw. */
pub fn score_text(score: i32) -> String {
    if score > MATE - 1000 {
        format!("MATE +{}", MATE - score)
    } else if score < -MATE + 1000 {
        format!("MATE -{}", MATE + score)
    } else {
        score.to_string()
    }
}

/**
Paint the board and report a `(row, col)` click, if any. Pure view over
the game state and the advisory view; nothing here mutates either.
*/
pub fn board_canvas(ui: &mut Ui, cell: f32, game: &Game, view: &AdvisoryView) -> Option<(u8, u8)> {
    let (response, painter) = ui.allocate_painter(Vec2::splat(cell * 8.0), Sense::click());
    let origin = response.rect.min;
    let square_center = |row: u8, col: u8| {
        Pos2::new(
            origin.x + (col as f32 + 0.5) * cell,
            origin.y + (row as f32 + 0.5) * cell,
        )
    };

    for row in 0..8u8 {
        for col in 0..8u8 {
            let corner = Pos2::new(
                origin.x + col as f32 * cell,
                origin.y + row as f32 * cell,
            );
            let color = if game.selection() == Some((row, col)) {
                SELECTED_SQUARE
            } else if (row + col) % 2 == 0 {
                LIGHT_SQUARE
            } else {
                DARK_SQUARE
            };
            painter.rect_filled(Rect::from_min_size(corner, Vec2::splat(cell)), 0.0, color);
        }
    }

    if let Some(steps) = view.hint() {
        for step in steps {
            let from = square_center(step.from.0, step.from.1);
            let to = square_center(step.to.0, step.to.1);
            painter.circle_filled(from, 5.0, HINT_COLOR);
            painter.arrow(from, to - from, Stroke::new(4.0, HINT_COLOR));
        }
    }

    for candidate in game.candidate_moves() {
        let (row, col) = candidate.destination();
        painter.circle_filled(square_center(row, col), 10.0, DESTINATION_FILL);
        painter.circle_stroke(
            square_center(row, col),
            10.0,
            Stroke::new(2.0, DESTINATION_RING),
        );
    }

    for row in 0..8u8 {
        for col in 0..8u8 {
            let Some(piece) = game.board().get(row, col) else {
                continue;
            };
            let center = square_center(row, col);
            let radius = cell / 2.0 - 10.0;
            let disc = if piece.color == Color::White {
                WHITE_DISC
            } else {
                BLACK_DISC
            };
            painter.circle_filled(center, radius, disc);
            if piece.is_king() {
                painter.circle_stroke(center, radius, Stroke::new(3.0, KING_RING));
                let label = if piece.color == Color::White {
                    Color32::BLACK
                } else {
                    Color32::WHITE
                };
                painter.text(
                    center,
                    Align2::CENTER_CENTER,
                    "K",
                    FontId::proportional(20.0),
                    label,
                );
            } else {
                let outline = if piece.color == Color::White {
                    Color32::BLACK
                } else {
                    Color32::WHITE
                };
                painter.circle_stroke(center, radius, Stroke::new(1.0, outline));
            }
        }
    }

    if response.clicked() {
        if let Some(pos) = response.interact_pointer_pos() {
            let col = ((pos.x - origin.x) / cell).floor() as i32;
            let row = ((pos.y - origin.y) / cell).floor() as i32;
            if (0..8).contains(&row) && (0..8).contains(&col) {
                return Some((row as u8, col as u8));
            }
        }
    }
    None
}
