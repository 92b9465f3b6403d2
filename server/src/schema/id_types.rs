use serde::{Deserialize, Serialize};

use folio_core::model;

use crate::http_error::RequestError;

macro_rules! impl_api_id {
    ($ident:ident) => {
        impl From<&model::$ident> for $ident {
            fn from(value: &model::$ident) -> Self {
                $ident(value.0.to_string())
            }
        }

        impl From<model::$ident> for $ident {
            fn from(value: model::$ident) -> Self {
                (&value).into()
            }
        }

        impl TryFrom<&$ident> for model::$ident {
            type Error = RequestError;
            fn try_from(value: &$ident) -> Result<Self, Self::Error> {
                // a malformed id can not name an existing row
                match value.0.parse::<i64>() {
                    Ok(id) => Ok(model::$ident(id)),
                    Err(_) => Err(RequestError::NotFound),
                }
            }
        }

        impl TryFrom<$ident> for model::$ident {
            type Error = RequestError;
            fn try_from(value: $ident) -> Result<Self, Self::Error> {
                (&value).try_into()
            }
        }
    };
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct ProjectId(pub String);
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct ImageId(pub String);

impl_api_id!(ProjectId);
impl_api_id!(ImageId);

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ids_round_trip_as_strings() {
        let api: ProjectId = model::ProjectId(12).into();
        assert_eq!(api, ProjectId("12".into()));
        assert_eq!(model::ProjectId::try_from(api), Ok(model::ProjectId(12)));
        assert_eq!(
            model::ProjectId::try_from(ProjectId("12abc".into())),
            Err(RequestError::NotFound)
        );
    }
}
