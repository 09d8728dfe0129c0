use cuesight_core::Table;

use crate::{AnalysisRequest, BallDescriptor};

fn push_ball(out: &mut String, ball: &BallDescriptor) {
    out.push_str(&ball.label);
    out.push_str(" (");
    out.push_str(ball.kind.as_str());
    out.push_str("): (");
    out.push_str(&ball.x.to_string());
    out.push_str(", ");
    out.push_str(&ball.y.to_string());
    out.push(')');
}

/// Convert the request to a compact scene description for the model.
pub fn serialize_scene(request: &AnalysisRequest) -> String {
    let spec = request.game_type.spec();
    let mut out = String::with_capacity(512);

    out.push_str("GAME: ");
    out.push_str(spec.name);
    out.push_str(" (");
    out.push_str(spec.id.id());
    out.push_str(")\nRULE: ");
    out.push_str(spec.rules);
    out.push_str("\nCUE BALL: ");
    push_ball(&mut out, &request.cue_ball);
    out.push_str("\nBALLS:\n");
    for ball in &request.balls {
        out.push_str("- ");
        push_ball(&mut out, ball);
        out.push('\n');
    }

    out
}

/// The two halves of one model call: the fixed coaching preamble and the
/// scene-specific user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

pub fn system_prompt(table: Table) -> String {
    format!(
        "You are a world-class carom billiards coach. Find the best shot for the cue ball in the layout you are given:\n\
- the point to strike (estimated table coordinate)\n\
- the path of the cue ball, including the predicted cushion rebounds\n\
- which object ball it should contact first\n\
- how many cushions the shot uses\n\n\
COORDINATES: the table is {w}x{h} with the origin (0, 0) at the top-left corner. \
Every x must be between 0 and {w}, every y between 0 and {h}.\n\n\
Respond with ONE JSON object only, with exactly these three fields:\n\
{{\n  \"text\": \"explanation in 2-3 sentences\",\n  \"strokePoint\": [x, y],\n  \"path\": [[x1, y1], [x2, y2], [x3, y3]]\n}}\n\
\"strokePoint\" is a two-number array. \"path\" is an array of two-number arrays in travel order. \
Output ONLY the JSON object, nothing else.",
        w = table.width,
        h = table.height,
    )
}

pub fn user_message(request: &AnalysisRequest) -> String {
    format!("{}\nSuggest the best shot.", serialize_scene(request))
}

/// Everything sent to the model for one analysis.
pub fn instruction(request: &AnalysisRequest, table: Table) -> Prompt {
    Prompt {
        system: system_prompt(table),
        user: user_message(request),
    }
}
