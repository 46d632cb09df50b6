//! Generic value-to-value transforms.
//!
//! A [`Decorator`] turns one value into another, usually a handler into a
//! handler that does more around it. Route middlewares and router-wide
//! decorators are both decorators over [`BoxedHandler`](crate::BoxedHandler);
//! the composer chains two of them so that the first one is applied first and
//! therefore ends up innermost.

use std::fmt;

pub trait Decorator<In> {
    type Out;

    fn decorate(&self, raw: In) -> Self::Out;
}

pub trait DecoratorExt<In>: Decorator<In> {
    /// Applies `self` first, then `decorator` on its output.
    fn and_then<D>(self, decorator: D) -> DecoratorComposer<Self, D>
    where
        Self: Sized,
    {
        DecoratorComposer::new(self, decorator)
    }

    /// Applies `decorator` first, then `self` on its output.
    fn compose<D>(self, decorator: D) -> DecoratorComposer<D, Self>
    where
        Self: Sized,
    {
        DecoratorComposer::new(decorator, self)
    }
}

impl<T: Decorator<In> + ?Sized, In> DecoratorExt<In> for T {}

#[derive(Default, Clone, Copy, Debug)]
pub struct IdentityDecorator;

impl<In> Decorator<In> for IdentityDecorator {
    type Out = In;

    #[inline(always)]
    fn decorate(&self, raw: In) -> Self::Out {
        raw
    }
}

#[derive(Default, Clone, Copy, Debug)]
pub struct DecoratorComposer<D1, D2> {
    decorator_1: D1,
    decorator_2: D2,
}

impl<D1, D2> DecoratorComposer<D1, D2> {
    pub fn new(decorator_1: D1, decorator_2: D2) -> Self {
        Self { decorator_1, decorator_2 }
    }
}

impl<In, D1, D2> Decorator<In> for DecoratorComposer<D1, D2>
where
    D1: Decorator<In>,
    D2: Decorator<D1::Out>,
{
    type Out = D2::Out;

    fn decorate(&self, raw: In) -> Self::Out {
        let output_1 = self.decorator_1.decorate(raw);
        self.decorator_2.decorate(output_1)
    }
}

#[derive(Clone, Copy)]
pub struct DecoratorFn<F> {
    f: F,
}

pub fn decorator_fn<In, Out, F>(f: F) -> DecoratorFn<F>
where
    F: Fn(In) -> Out,
{
    DecoratorFn { f }
}

impl<F> fmt::Debug for DecoratorFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoratorFn").finish_non_exhaustive()
    }
}

impl<In, Out, F> Decorator<In> for DecoratorFn<F>
where
    F: Fn(In) -> Out,
{
    type Out = Out;

    fn decorate(&self, raw: In) -> Self::Out {
        (self.f)(raw)
    }
}

#[cfg(test)]
mod tests {
    use crate::decorator::{decorator_fn, Decorator, DecoratorExt, IdentityDecorator};

    #[test]
    fn test_identity() {
        assert_eq!(IdentityDecorator.decorate("raw"), "raw");
    }

    #[test]
    fn test_and_then_applies_left_first() {
        let d1 = decorator_fn(|s: String| format!("d1({s})"));
        let d2 = decorator_fn(|s: String| format!("d2({s})"));

        let composed = DecoratorExt::<String>::and_then(IdentityDecorator, d1);
        let composed = DecoratorExt::<String>::and_then(composed, d2);
        assert_eq!(composed.decorate("h".to_string()), "d2(d1(h))");
    }

    #[test]
    fn test_compose_applies_right_first() {
        let d1 = decorator_fn(|s: String| format!("d1({s})"));
        let d2 = decorator_fn(|s: String| format!("d2({s})"));

        let composed = DecoratorExt::<String>::compose(d1, d2);
        assert_eq!(composed.decorate("h".to_string()), "d1(d2(h))");
    }

    #[test]
    fn test_changes_output_type() {
        let len = decorator_fn(|s: String| s.len());
        let double = decorator_fn(|n: usize| n * 2);

        let composed = DecoratorExt::<String>::and_then(len, double);
        assert_eq!(composed.decorate("four".to_string()), 8);
    }
}
