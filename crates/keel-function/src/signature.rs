//! Call signatures as argument tuples.
//!
//! `Function<(A, B), R>` stores something callable as `fn(A, B) -> R`.
//! [`Arguments`] ties a tuple to its plain function-pointer type;
//! [`Invocable`] is implemented for every `FnMut` of matching arity, so a
//! closure, a function item or any other callable value can be stored.

/// An argument tuple for a call returning `R`.
pub trait Arguments<R>: Sized {
    /// The plain function-pointer type with this signature.
    type Plain: Copy;

    /// Call `f` with the unpacked arguments.
    fn call_plain(f: Self::Plain, args: Self) -> R;
}

/// A value callable with the arguments `Args`, returning `R`.
pub trait Invocable<Args, R> {
    /// Call the value with the unpacked arguments.
    fn invoke(&mut self, args: Args) -> R;
}

macro_rules! impl_signature {
    ($($arg:ident),*) => {
        impl<R, $($arg,)*> Arguments<R> for ($($arg,)*) {
            type Plain = fn($($arg),*) -> R;

            #[inline]
            #[allow(non_snake_case)]
            fn call_plain(f: Self::Plain, ($($arg,)*): Self) -> R {
                f($($arg),*)
            }
        }

        impl<F, R, $($arg,)*> Invocable<($($arg,)*), R> for F
        where
            F: FnMut($($arg),*) -> R,
        {
            #[inline]
            #[allow(non_snake_case)]
            fn invoke(&mut self, ($($arg,)*): ($($arg,)*)) -> R {
                self($($arg),*)
            }
        }
    };
}

impl_signature!();
impl_signature!(A);
impl_signature!(A, B);
impl_signature!(A, B, C);
impl_signature!(A, B, C, D);
impl_signature!(A, B, C, D, E);
impl_signature!(A, B, C, D, E, G);
