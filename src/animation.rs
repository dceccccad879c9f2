//! Time-based property tweens.
//!
//! The [`Animator`] keeps at most one [`Tween`] per `(node, property)` pair.
//! Starting a tween on a pair that is already animating replaces the old one;
//! the new tween starts from wherever the property currently is.

use crate::scene::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::f32::consts::PI;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing
{
        Linear,
        SineInOut,
        QuadInOut,
        CubicInOut,
}

impl Easing
{
        /// Maps linear progress `t` in `[0, 1]` onto the curve.
        pub fn apply(
                self,
                t: f32,
        ) -> f32
        {
                let t = t.clamp(0.0, 1.0);

                match self
                {
                        Easing::Linear => t,
                        Easing::SineInOut => -((PI * t).cos() - 1.0) / 2.0,
                        Easing::QuadInOut =>
                        {
                                if t < 0.5
                                {
                                        2.0 * t * t
                                }
                                else
                                {
                                        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                                }
                        }
                        Easing::CubicInOut =>
                        {
                                if t < 0.5
                                {
                                        4.0 * t * t * t
                                }
                                else
                                {
                                        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                                }
                        }
                }
        }
}

/// Scalar node properties a tween can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property
{
        PositionX,
        PositionY,
        PositionZ,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tween
{
        pub from: f32,
        pub to: f32,
        pub duration: f32,
        pub elapsed: f32,
        pub easing: Easing,
}

impl Tween
{
        pub fn new(
                from: f32,
                to: f32,
                duration: f32,
                easing: Easing,
        ) -> Self
        {
                Self {
                        from,
                        to,
                        duration: duration.max(0.0),
                        elapsed: 0.0,
                        easing,
                }
        }

        pub fn progress(&self) -> f32
        {
                if self.duration <= 0.0
                {
                        return 1.0;
                }

                (self.elapsed / self.duration).min(1.0)
        }

        pub fn value(&self) -> f32
        {
                let t = self.progress();

                // Land exactly on the target instead of relying on the curve.
                if t >= 1.0
                {
                        return self.to;
                }

                self.from + (self.to - self.from) * self.easing.apply(t)
        }

        pub fn is_finished(&self) -> bool
        {
                self.progress() >= 1.0
        }

        pub fn step(
                &mut self,
                dt: f32,
        ) -> f32
        {
                self.elapsed += dt;
                self.value()
        }
}

/// One property write produced by [`Animator::tick`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TweenSample
{
        pub node: NodeId,
        pub property: Property,
        pub value: f32,
        pub finished: bool,
}

#[derive(Debug, Default)]
pub struct Animator
{
        tweens: HashMap<(NodeId, Property), Tween>,
}

impl Animator
{
        pub fn new() -> Self
        {
                Self {
                        tweens: HashMap::new(),
                }
        }

        /// Starts `tween` on `(node, property)`, returning the tween it
        /// superseded, if any.
        pub fn start(
                &mut self,
                node: NodeId,
                property: Property,
                tween: Tween,
        ) -> Option<Tween>
        {
                let replaced = self.tweens.insert((node, property), tween);

                if let Some(old) = &replaced
                {
                        log::debug!(
                                "Tween on {:?}/{:?} towards {} superseded",
                                node,
                                property,
                                old.to
                        );
                }

                replaced
        }

        pub fn active(
                &self,
                node: NodeId,
                property: Property,
        ) -> Option<&Tween>
        {
                self.tweens.get(&(node, property))
        }

        pub fn len(&self) -> usize
        {
                self.tweens.len()
        }

        pub fn is_empty(&self) -> bool
        {
                self.tweens.is_empty()
        }

        /// Advances every tween by `dt` and drops the finished ones.
        pub fn tick(
                &mut self,
                dt: Duration,
        ) -> Vec<TweenSample>
        {
                let dt = dt.as_secs_f32();

                let mut samples = Vec::with_capacity(self.tweens.len());

                for (&(node, property), tween) in self.tweens.iter_mut()
                {
                        let value = tween.step(dt);

                        samples.push(TweenSample {
                                node,
                                property,
                                value,
                                finished: tween.is_finished(),
                        });
                }

                self.tweens.retain(|_, tween| !tween.is_finished());

                samples
        }
}

#[cfg(test)]
mod tests
{
        use super::*;

        const EPS: f32 = 1e-6;

        #[test]
        fn easing_curves_hit_endpoints_and_midpoint()
        {
                for easing in [
                        Easing::Linear,
                        Easing::SineInOut,
                        Easing::QuadInOut,
                        Easing::CubicInOut,
                ]
                {
                        assert!(easing.apply(0.0).abs() < EPS, "{easing:?} at 0");
                        assert!((easing.apply(1.0) - 1.0).abs() < EPS, "{easing:?} at 1");
                        assert!((easing.apply(0.5) - 0.5).abs() < EPS, "{easing:?} at 0.5");
                }
        }

        #[test]
        fn in_out_curves_start_slow()
        {
                assert!(Easing::CubicInOut.apply(0.1) < 0.1);
                assert!(Easing::QuadInOut.apply(0.1) < 0.1);
                assert!(Easing::CubicInOut.apply(0.9) > 0.9);
        }

        #[test]
        fn tween_lands_on_target()
        {
                let mut tween = Tween::new(2.0, -4.0, 1.0, Easing::CubicInOut);

                tween.step(0.25);
                assert!(!tween.is_finished());

                let v = tween.step(0.75);
                assert_eq!(v, -4.0);
                assert!(tween.is_finished());
        }

        #[test]
        fn zero_duration_finishes_immediately()
        {
                let tween = Tween::new(0.0, 3.0, 0.0, Easing::Linear);

                assert!(tween.is_finished());
                assert_eq!(tween.value(), 3.0);
        }

        #[test]
        fn new_tween_replaces_old_one()
        {
                let node = NodeId(0);
                let mut animator = Animator::new();

                assert!(animator
                        .start(node, Property::PositionY, Tween::new(0.0, 1.0, 1.0, Easing::Linear))
                        .is_none());

                let replaced = animator.start(
                        node,
                        Property::PositionY,
                        Tween::new(0.5, -1.0, 1.0, Easing::Linear),
                );

                assert_eq!(replaced.map(|t| t.to), Some(1.0));
                assert_eq!(animator.len(), 1);
                assert_eq!(animator.active(node, Property::PositionY).unwrap().to, -1.0);
        }

        #[test]
        fn tick_reports_and_drops_finished_tweens()
        {
                let node = NodeId(3);
                let mut animator = Animator::new();

                animator.start(node, Property::PositionY, Tween::new(0.0, 1.0, 0.5, Easing::Linear));

                let samples = animator.tick(Duration::from_millis(250));
                assert_eq!(samples.len(), 1);
                assert!((samples[0].value - 0.5).abs() < EPS);
                assert!(!samples[0].finished);

                let samples = animator.tick(Duration::from_millis(300));
                assert_eq!(samples[0].value, 1.0);
                assert!(samples[0].finished);
                assert!(animator.is_empty());
        }
}
