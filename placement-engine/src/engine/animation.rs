//! Eased transform animation, decoupled from any particular renderer.
//!
//! Mutating operations describe their intent as an [`AnimationRequest`]
//! carrying target, duration and easing; the rendering collaborator may apply
//! it itself, or leave the default driver here to tween the entity's
//! `Transform` and report [`AnimationCompleted`].

use bevy::prelude::*;

/// Easing curve for a transform animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    Linear,
    #[default]
    EaseInOut,
}

impl Easing {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
        }
    }
}

/// A requested eased move of one entity to a new translation and rotation.
#[derive(Event, Debug, Clone, Copy)]
pub struct AnimationRequest {
    pub target: Entity,
    pub translation: Vec3,
    pub rotation: Quat,
    /// Seconds; zero or negative applies immediately.
    pub duration: f32,
    pub easing: Easing,
}

/// Fired by the driver once a request has fully played out (or was applied
/// immediately).
#[derive(Event, Debug, Clone, Copy)]
pub struct AnimationCompleted {
    pub target: Entity,
}

/// In-flight tween state. A new request on the same entity replaces it.
#[derive(Component, Debug)]
pub struct ActiveAnimation {
    start_translation: Vec3,
    start_rotation: Quat,
    end_translation: Vec3,
    end_rotation: Quat,
    duration: f32,
    elapsed: f32,
    easing: Easing,
}

/// Turns requests into in-flight tweens; zero-duration requests are applied
/// on the spot.
pub fn start_requested_animations(
    mut requests: EventReader<AnimationRequest>,
    mut transforms: Query<&mut Transform>,
    mut completed: EventWriter<AnimationCompleted>,
    mut commands: Commands,
) {
    for request in requests.read() {
        // The target may have been despawned by a reset between the request
        // and this frame; drop the work silently.
        let Ok(mut transform) = transforms.get_mut(request.target) else {
            continue;
        };
        if request.duration <= 0.0 {
            transform.translation = request.translation;
            transform.rotation = request.rotation;
            completed.write(AnimationCompleted { target: request.target });
            continue;
        }
        commands.entity(request.target).insert(ActiveAnimation {
            start_translation: transform.translation,
            start_rotation: transform.rotation,
            end_translation: request.translation,
            end_rotation: request.rotation,
            duration: request.duration,
            elapsed: 0.0,
            easing: request.easing,
        });
    }
}

/// Advances in-flight tweens and reports completion.
pub fn drive_animations(
    time: Res<Time>,
    mut animations: Query<(Entity, &mut Transform, &mut ActiveAnimation)>,
    mut completed: EventWriter<AnimationCompleted>,
    mut commands: Commands,
) {
    for (entity, mut transform, mut animation) in &mut animations {
        animation.elapsed += time.delta_secs();
        let fraction = (animation.elapsed / animation.duration).min(1.0);
        let eased = animation.easing.apply(fraction);
        transform.translation = animation
            .start_translation
            .lerp(animation.end_translation, eased);
        transform.rotation = animation.start_rotation.slerp(animation.end_rotation, eased);
        if fraction >= 1.0 {
            commands.entity(entity).remove::<ActiveAnimation>();
            completed.write(AnimationCompleted { target: entity });
        }
    }
}
