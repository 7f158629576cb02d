//! Contributions: the composition list of a component.

use xtc_ir::{Composition, ConstId, Name};
use xtc_pool::Pool;
use xtc_wire::Reader;

use crate::TreeError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Contrib {
    pub composition: Composition,
    /// The contributed type.
    pub ty: ConstId,
    pub data: ContribData,
}

/// Composition-specific payload of a contribution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContribData {
    None,
    /// Annotation instance of an `Annotation` contribution.
    Annotation(ConstId),
    /// Property holding the delegate of a `Delegates` contribution.
    Delegate(ConstId),
    /// Type parameter bindings of an `Incorporates` contribution; `None`
    /// leaves the parameter unconstrained.
    Bindings(Vec<(Name, Option<ConstId>)>),
    /// Module of an `Import*` contribution.
    Import(ConstId),
}

impl Contrib {
    /// Read a contribution list: a count, then per entry the composition
    /// byte, the type and the composition's data.
    pub(crate) fn parse_list(r: &mut Reader<'_>, pool: &Pool) -> Result<Vec<Contrib>, TreeError> {
        let count = r.count()?;
        let mut contribs = Vec::with_capacity(count);
        for _ in 0..count {
            contribs.push(Contrib::parse(r, pool)?);
        }
        Ok(contribs)
    }

    fn parse(r: &mut Reader<'_>, pool: &Pool) -> Result<Contrib, TreeError> {
        let start = r.position();
        let tag = r.u8()?;
        let composition = Composition::from_tag(tag).ok_or(TreeError::BadTag {
            what: "composition",
            tag,
            span: r.span_from(start),
        })?;
        let ty = required(r, pool)?;
        let data = match composition {
            Composition::Annotation => ContribData::Annotation(required(r, pool)?),
            Composition::Delegates => ContribData::Delegate(required(r, pool)?),
            Composition::Incorporates => {
                let count = r.count()?;
                let mut bindings = Vec::with_capacity(count);
                for _ in 0..count {
                    let at = r.position();
                    let name_id = required(r, pool)?;
                    let name = pool.string(name_id).ok_or(TreeError::WrongConstant {
                        expected: "a type parameter name",
                        found: pool.entry(name_id).format(),
                        span: r.span_from(at),
                    })?;
                    bindings.push((name, optional(r, pool)?));
                }
                ContribData::Bindings(bindings)
            }
            Composition::ImportOptional
            | Composition::ImportDesired
            | Composition::ImportRequired
            | Composition::ImportEmbedded => ContribData::Import(required(r, pool)?),
            Composition::Extends
            | Composition::Implements
            | Composition::Into
            | Composition::RebasesOnto => ContribData::None,
        };
        Ok(Contrib {
            composition,
            ty,
            data,
        })
    }
}

/// Read an index that must name a pool entry.
pub(crate) fn required(r: &mut Reader<'_>, pool: &Pool) -> Result<ConstId, TreeError> {
    let start = r.position();
    let index = r.required_index()?;
    Ok(pool.checked(index, r.span_from(start))?)
}

/// Read an index where `-1` means none.
pub(crate) fn optional(r: &mut Reader<'_>, pool: &Pool) -> Result<Option<ConstId>, TreeError> {
    let start = r.position();
    match r.index()? {
        Some(index) => Ok(Some(pool.checked(index, r.span_from(start))?)),
        None => Ok(None),
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
