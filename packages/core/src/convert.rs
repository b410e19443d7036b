//! Converter traits and the dispatch funnel.
//!
//! Three calling conventions reach a converter: a runtime type token
//! resolved through a [`ConverterResolver`], a compile-time typed pair, or
//! an explicit converter instance. All of them reduce to one invocation
//! contract: project the source payload, run the converter against a
//! borrowed source, wrap the produced payload back into a [`Format`]. A
//! failed invocation never consumes the source.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::ConvertError;
use crate::format::{Format, FormatKind, FormatPayload};

/// Transforms one format payload into another.
///
/// The source is borrowed: a converter must not invalidate it, so a failed
/// conversion leaves the originating node untouched.
pub trait Converter<S: FormatPayload, D: FormatPayload> {
    /// Produce a destination payload from the source.
    fn convert(&self, source: &S) -> Result<D, ConvertError>;
}

/// Object-safe converter over untyped format slots.
///
/// This is the dynamic side of dispatch: discovery hands these out, and the
/// node invokes them without knowing the payload types.
///
/// # Object Safety
///
/// This trait is object-safe: you can use `Arc<dyn ErasedConverter>`.
pub trait ErasedConverter: Send + Sync {
    /// Kind of the payload this converter consumes.
    fn source_kind(&self) -> FormatKind;

    /// Kind of the payload this converter produces.
    fn dest_kind(&self) -> FormatKind;

    /// Run the conversion against an untyped format slot.
    fn convert_erased(&self, source: &Format) -> Result<Format, ConvertError>;
}

/// Adapter giving a typed [`Converter`] its [`ErasedConverter`] view.
///
/// The erased call goes through [`convert_with`], the same funnel the typed
/// conventions use, so behavior is identical regardless of how the converter
/// was supplied.
pub struct Erased<C, S, D> {
    inner: C,
    _pair: PhantomData<fn(&S) -> D>,
}

impl<C, S, D> Erased<C, S, D>
where
    S: FormatPayload,
    D: FormatPayload,
    C: Converter<S, D>,
{
    /// Wrap a typed converter.
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            _pair: PhantomData,
        }
    }

    /// Unwrap the typed converter.
    pub fn into_inner(self) -> C {
        self.inner
    }
}

impl<C, S, D> ErasedConverter for Erased<C, S, D>
where
    S: FormatPayload,
    D: FormatPayload,
    C: Converter<S, D> + Send + Sync,
{
    fn source_kind(&self) -> FormatKind {
        S::KIND
    }

    fn dest_kind(&self) -> FormatKind {
        D::KIND
    }

    fn convert_erased(&self, source: &Format) -> Result<Format, ConvertError> {
        convert_with(&self.inner, source)
    }
}

/// Erase a typed converter into a shareable handle.
///
/// Registries hand these to [`convert_to`]; sharing is cheap because the
/// handle is reference-counted.
pub fn erase<S, D, C>(converter: C) -> Arc<dyn ErasedConverter>
where
    S: FormatPayload + 'static,
    D: FormatPayload + 'static,
    C: Converter<S, D> + Send + Sync + 'static,
{
    Arc::new(Erased::new(converter))
}

/// Locates a converter for a `(source, dest)` pair of kinds.
///
/// Implemented by external registries; the core only defines the seam.
/// `None` means discovery found no candidate and surfaces as
/// [`ConvertError::NoConverter`].
pub trait ConverterResolver {
    /// Find a converter capable of `source -> dest`.
    fn resolve(&self, source: FormatKind, dest: FormatKind) -> Option<Arc<dyn ErasedConverter>>;
}

/// Invoke a typed converter against an untyped format slot.
///
/// The funnel shared by every calling convention: projects the source
/// payload (failing with [`ConvertError::SourceMismatch`] if the variant
/// does not match the converter's declared source), invokes the converter,
/// and wraps the result.
pub fn convert_with<S, D>(
    converter: &impl Converter<S, D>,
    source: &Format,
) -> Result<Format, ConvertError>
where
    S: FormatPayload,
    D: FormatPayload,
{
    let payload = S::as_payload(source).ok_or(ConvertError::SourceMismatch {
        expected: S::KIND,
        actual: source.kind(),
    })?;
    Ok(converter.convert(payload)?.into_format())
}

/// Resolve a converter for `source.kind() -> dest` and invoke it.
///
/// A resolver that returns a converter declared for a different pair is
/// treated as a discovery miss: the pair the caller asked for has no usable
/// converter.
pub fn convert_to(
    dest: FormatKind,
    source: &Format,
    resolver: &dyn ConverterResolver,
) -> Result<Format, ConvertError> {
    let converter =
        resolver
            .resolve(source.kind(), dest)
            .ok_or(ConvertError::NoConverter {
                source: source.kind(),
                dest,
            })?;
    if converter.source_kind() != source.kind() || converter.dest_kind() != dest {
        return Err(ConvertError::NoConverter {
            source: source.kind(),
            dest,
        });
    }
    converter.convert_erased(source)
}
