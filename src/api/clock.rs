use actix_web::{FromRequest, HttpRequest, dev::Payload, web::Data};
use chrono::{Local, NaiveDateTime};
use futures::future::{Ready, ready};

/// Source of "now" for punch handlers: the host's local clock, or a fixed
/// instant under test.
#[derive(Debug, Copy, Clone, Default)]
pub struct Clock {
    fixed: Option<NaiveDateTime>,
}

impl Clock {
    pub fn system() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn fixed(at: NaiveDateTime) -> Self {
        Self { fixed: Some(at) }
    }

    pub fn now(&self) -> NaiveDateTime {
        self.fixed.unwrap_or_else(|| Local::now().naive_local())
    }
}

/// Request-time timestamp taken from the app's [`Clock`].
pub struct Now(pub NaiveDateTime);

impl FromRequest for Now {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        match req.app_data::<Data<Clock>>() {
            Some(clock) => ready(Ok(Now(clock.now()))),
            None => ready(Err(actix_web::error::ErrorInternalServerError(
                "Clock missing",
            ))),
        }
    }
}
