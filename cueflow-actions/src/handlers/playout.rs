//! `playAnimation`, `playTimeline` and template toggling.

use crate::action::TimelineStep;
use cueflow_core::address::{find_layer, find_template};
use cueflow_core::context::ExecutionContext;
use cueflow_core::error::{CueError, Result};
use cueflow_core::model::{Phase, Template};
use serde_json::Value;

fn template(reference: &str, ctx: &ExecutionContext) -> Result<Template> {
    find_template(reference, ctx).ok_or_else(|| CueError::not_found("template", reference))
}

fn layer_for(template: &Template, layer: Option<&str>, ctx: &ExecutionContext) -> Result<String> {
    match layer {
        Some(reference) => find_layer(reference, ctx)
            .map(|l| l.id)
            .ok_or_else(|| CueError::not_found("layer", reference)),
        None => template.layer_id.clone().ok_or_else(|| CueError::ActionFailed {
            action: "playAnimation".to_string(),
            cause: format!("template '{}' has no layer", template.name),
        }),
    }
}

/// Run one phase of a template. Returns the layer id used.
pub fn play_animation(
    reference: &str,
    layer: Option<&str>,
    phase: Phase,
    ctx: &ExecutionContext,
) -> Result<String> {
    let template = template(reference, ctx)?;
    let layer_id = layer_for(&template, layer, ctx)?;
    tracing::debug!(template = %template.id, layer = %layer_id, phase = %phase, "Playout");
    match phase {
        Phase::In => ctx.templates().play_in(&template.id, &layer_id)?,
        Phase::Loop => ctx.templates().play_loop(&template.id, &layer_id)?,
        Phase::Out => ctx.templates().play_out(&layer_id)?,
    }
    Ok(layer_id)
}

/// Run timeline steps in order, suspending for each step's gap.
pub async fn play_timeline(steps: &[TimelineStep], ctx: &ExecutionContext) -> Result<()> {
    for step in steps {
        if step.delay_ms > 0 {
            ctx.delay(step.delay_ms).await;
        }
        play_animation(&step.template, step.layer.as_deref(), step.phase, ctx)?;
    }
    Ok(())
}

/// State key holding whether a template was last played in.
pub fn on_air_key(template_id: &str) -> String {
    format!("__onAir_{}", template_id)
}

/// Play a template in if it is off, out if it is on. The on/off flag lives
/// in runtime state. Returns the phase that was played.
pub fn toggle_template(reference: &str, layer: Option<&str>, ctx: &ExecutionContext) -> Result<Phase> {
    let template = template(reference, ctx)?;
    let key = on_air_key(&template.id);
    let on_air = matches!(ctx.store().get(&key), Some(Value::Bool(true)));
    let phase = if on_air { Phase::Out } else { Phase::In };
    play_animation(&template.id, layer, phase, ctx)?;
    ctx.store().set(&key, Value::Bool(!on_air));
    Ok(phase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cueflow_core::model::Layer;
    use cueflow_core::providers::PlayoutCall;
    use cueflow_core::testing::TestHarness;

    fn harness() -> TestHarness {
        TestHarness::builder()
            .template(Template::new("t1", "Lower Third", Some("L1")))
            .template(Template::new("t2", "Floating", None))
            .layer(Layer::new("L1", "Main"))
            .layer(Layer::new("L2", "Overlay"))
            .build()
    }

    #[test]
    fn phases_map_to_playout_calls() {
        let h = harness();
        play_animation("@template.Lower_Third", None, Phase::In, &h.ctx).unwrap();
        play_animation("t1", Some("Overlay"), Phase::Loop, &h.ctx).unwrap();
        play_animation("Lower Third", None, Phase::Out, &h.ctx).unwrap();
        assert_eq!(
            h.playout.calls(),
            vec![
                PlayoutCall::PlayIn { template_id: "t1".into(), layer_id: "L1".into() },
                PlayoutCall::PlayLoop { template_id: "t1".into(), layer_id: "L2".into() },
                PlayoutCall::PlayOut { layer_id: "L1".into() },
            ]
        );
    }

    #[test]
    fn template_without_layer_needs_one() {
        let h = harness();
        assert!(play_animation("Floating", None, Phase::In, &h.ctx).is_err());
        assert_eq!(play_animation("Floating", Some("L2"), Phase::In, &h.ctx).unwrap(), "L2");
    }

    #[test]
    fn toggle_alternates() {
        let h = harness();
        assert_eq!(toggle_template("t1", None, &h.ctx).unwrap(), Phase::In);
        assert_eq!(toggle_template("t1", None, &h.ctx).unwrap(), Phase::Out);
        assert_eq!(h.playout.on_air("L1"), None);
    }

    #[tokio::test]
    async fn timeline_waits_between_steps() {
        let h = harness();
        let steps = vec![
            TimelineStep { template: "t1".into(), layer: None, phase: Phase::In, delay_ms: 0 },
            TimelineStep { template: "t1".into(), layer: None, phase: Phase::Out, delay_ms: 3_000 },
        ];
        play_timeline(&steps, &h.ctx).await.unwrap();
        assert_eq!(h.playout.calls().len(), 2);
        assert_eq!(h.clock.total_slept().as_millis(), 3_000);
    }
}
