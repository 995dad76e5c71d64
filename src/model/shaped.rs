use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, FixedOffset, Utc};
use serde_json::Value;

use super::{Composite, Field, Mapping, Optional, Record, Scalar, Sequence};

/// Types that can present themselves as a [`Record`].
///
/// `template` describes the zero value of the type and is what the shape
/// generator falls back to when a collection has no live elements.
pub trait Shaped {
    fn to_record(&self) -> Record;

    fn template() -> Record
    where
        Self: Sized;
}

macro_rules! shaped_scalar {
    ($variant:ident, $zero:expr, $($ty:ty),+) => {
        $(
            impl Shaped for $ty {
                fn to_record(&self) -> Record {
                    Record::Leaf(Scalar::$variant((*self).into()))
                }

                fn template() -> Record {
                    Record::Leaf(Scalar::$variant($zero))
                }
            }
        )+
    };
}

shaped_scalar!(Integer, 0, i8, i16, i32, i64);
shaped_scalar!(Unsigned, 0, u8, u16, u32, u64);
shaped_scalar!(Float, 0.0, f32, f64);
shaped_scalar!(Boolean, false, bool);

impl Shaped for isize {
    fn to_record(&self) -> Record {
        Record::Leaf(Scalar::Integer(*self as i64))
    }

    fn template() -> Record {
        Record::Leaf(Scalar::Integer(0))
    }
}

impl Shaped for usize {
    fn to_record(&self) -> Record {
        Record::Leaf(Scalar::Unsigned(*self as u64))
    }

    fn template() -> Record {
        Record::Leaf(Scalar::Unsigned(0))
    }
}

impl Shaped for String {
    fn to_record(&self) -> Record {
        Record::Leaf(Scalar::Text(self.clone()))
    }

    fn template() -> Record {
        Record::Leaf(Scalar::Text(String::new()))
    }
}

impl Shaped for DateTime<FixedOffset> {
    fn to_record(&self) -> Record {
        Record::Leaf(Scalar::Instant(*self))
    }

    fn template() -> Record {
        Record::Leaf(Scalar::Instant(DateTime::<Utc>::default().into()))
    }
}

impl Shaped for DateTime<Utc> {
    fn to_record(&self) -> Record {
        Record::Leaf(Scalar::Instant((*self).into()))
    }

    fn template() -> Record {
        <DateTime<FixedOffset> as Shaped>::template()
    }
}

impl<T: Shaped> Shaped for Option<T> {
    fn to_record(&self) -> Record {
        Record::Optional(Optional {
            value: self.as_ref().map(|value| Box::new(value.to_record())),
            template: Some(T::template),
        })
    }

    fn template() -> Record {
        Record::Optional(Optional::absent(Some(T::template)))
    }
}

impl<T: Shaped> Shaped for Box<T> {
    fn to_record(&self) -> Record {
        self.as_ref().to_record()
    }

    fn template() -> Record {
        T::template()
    }
}

impl<T: Shaped> Shaped for Vec<T> {
    fn to_record(&self) -> Record {
        Record::Sequence(Sequence {
            items: self.iter().map(Shaped::to_record).collect(),
            element: Some(T::template),
        })
    }

    fn template() -> Record {
        Record::Sequence(Sequence::default().with_element(T::template))
    }
}

impl<T: Shaped> Shaped for BTreeMap<String, T> {
    fn to_record(&self) -> Record {
        Record::Mapping(Mapping {
            entries: self
                .iter()
                .map(|(key, value)| (key.clone(), value.to_record()))
                .collect(),
            element: Some(T::template),
        })
    }

    fn template() -> Record {
        Record::Mapping(Mapping {
            entries: BTreeMap::new(),
            element: Some(T::template),
        })
    }
}

impl<T: Shaped, S> Shaped for HashMap<String, T, S> {
    fn to_record(&self) -> Record {
        Record::Mapping(Mapping {
            entries: self
                .iter()
                .map(|(key, value)| (key.clone(), value.to_record()))
                .collect(),
            element: Some(T::template),
        })
    }

    fn template() -> Record {
        <BTreeMap<String, T> as Shaped>::template()
    }
}

/// JSON objects become composites whose members follow document order;
/// `null` is an absent value of unknown type.
impl Shaped for Value {
    fn to_record(&self) -> Record {
        match self {
            Value::Null => Record::absent(),
            Value::Bool(value) => Record::Leaf(Scalar::Boolean(*value)),
            Value::Number(number) => {
                let scalar = if let Some(value) = number.as_i64() {
                    Scalar::Integer(value)
                } else if let Some(value) = number.as_u64() {
                    Scalar::Unsigned(value)
                } else {
                    Scalar::Float(number.as_f64().unwrap_or_default())
                };
                Record::Leaf(scalar)
            }
            Value::String(value) => Record::text(value.clone()),
            Value::Array(items) => {
                Record::Sequence(Sequence::new(items.iter().map(Shaped::to_record).collect()))
            }
            // Without members to declare, an empty object is an empty mapping.
            Value::Object(map) if map.is_empty() => Record::Mapping(Mapping::default()),
            Value::Object(map) => {
                let mut composite = Composite::new("object");
                for (key, value) in map {
                    composite.push(Field::verbatim(key.clone(), value.to_record()));
                }
                Record::Composite(composite)
            }
        }
    }

    fn template() -> Record {
        Record::absent()
    }
}
