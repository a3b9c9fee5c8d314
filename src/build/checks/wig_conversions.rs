use super::{BuildCheck, Warnings};
use crate::build::warnings::{BuildWarning, BuildWarningId, messages};
use crate::build::{BuildSettings, Profile};
use crate::npc::AttributeGroup;

/// Surfaces wig problems: bald NPCs losing their wig to another plugin, and
/// wigs left in place because de-wiggification is off.
#[derive(Debug, Default, Clone, Copy)]
pub struct WigConversions;

impl BuildCheck for WigConversions {
    fn name(&self) -> &str {
        "WigConversions"
    }

    fn run<'a>(&'a self, profile: &'a Profile, settings: &'a BuildSettings) -> Warnings<'a> {
        Box::new(profile.npcs.iter().flat_map(move |npc| {
            let mut found: Vec<BuildWarning> = npc
                .assess_wig_safety()
                .into_iter()
                .map(|w| {
                    BuildWarning::new(
                        BuildWarningId::WigNotMatchedBald,
                        messages::wig_not_matched_bald(
                            &npc.editor_id,
                            &npc.name,
                            &w.face_plugin,
                            w.wig_model_name.as_deref().unwrap_or_default(),
                            &w.target_plugin,
                        ),
                    )
                    .with_record(w.npc_key)
                    .with_plugin(w.face_plugin)
                })
                .collect();

            if !settings.enable_dewiggify {
                let face_plugin = npc.resolve_winner(AttributeGroup::Face);
                if let Some(wig) = npc.link(face_plugin).and_then(|x| x.wig.as_ref()) {
                    found.push(
                        BuildWarning::new(
                            BuildWarningId::WigConversionDisabled,
                            messages::wig_conversion_disabled(
                                &npc.editor_id,
                                &npc.name,
                                face_plugin,
                                wig.is_bald,
                            ),
                        )
                        .with_record(npc.key.clone())
                        .with_plugin(face_plugin),
                    );
                }
            }
            found
        }))
    }
}
