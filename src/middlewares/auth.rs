use crate::error::{AppError, AppResult};
use crate::services::AuthService;
use crate::utils::{JwtService, Role};
use actix_web::http::Method;
use actix_web::{
    Error, FromRequest, HttpMessage, HttpRequest, web,
    dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};
use std::rc::Rc;

struct PublicPaths {
    exact_paths: Vec<&'static str>,
    prefix_paths: Vec<&'static str>,
    // under a public prefix but still authenticated
    excluded_paths: Vec<&'static str>,
}

impl PublicPaths {
    fn new() -> Self {
        Self {
            exact_paths: vec!["/health", "/swagger-ui", "/swagger-ui/", "/api-docs/openapi.json"],
            prefix_paths: vec!["/swagger-ui/", "/api-docs/", "/api/v1/auth/"],
            excluded_paths: vec!["/api/v1/auth/me"],
        }
    }

    fn is_public_path(&self, path: &str) -> bool {
        if self
            .excluded_paths
            .iter()
            .any(|&excluded| path.starts_with(excluded))
        {
            return false;
        }

        if self.exact_paths.contains(&path) {
            return true;
        }

        self.prefix_paths
            .iter()
            .any(|&prefix| path.starts_with(prefix))
    }
}

/// Who is calling, taken from a verified access token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    /// User id for students, apollonyar id for staff
    pub id: i32,
    pub role: Role,
}

impl Identity {
    /// The acting apollonyar id
    pub fn require_staff(&self) -> AppResult<i32> {
        if self.role.is_staff() {
            Ok(self.id)
        } else {
            Err(AppError::PermissionDenied)
        }
    }

    pub fn require_admin(&self) -> AppResult<i32> {
        if self.role == Role::Admin {
            Ok(self.id)
        } else {
            Err(AppError::PermissionDenied)
        }
    }

    /// The student's user id, or `None` for staff
    pub fn student_id(&self) -> Option<i32> {
        (self.role == Role::Student).then_some(self.id)
    }
}

impl FromRequest for Identity {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<Identity>()
                .copied()
                .ok_or_else(|| AppError::AuthError("Missing access token".to_string())),
        )
    }
}

pub struct AuthMiddleware {
    jwt_service: JwtService,
}

impl AuthMiddleware {
    pub fn new(jwt_service: JwtService) -> Self {
        Self { jwt_service }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
            jwt_service: self.jwt_service.clone(),
            public_paths: PublicPaths::new(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
    jwt_service: JwtService,
    public_paths: PublicPaths,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // CORS preflight
        if req.method() == Method::OPTIONS {
            let fut = self.service.call(req);
            return Box::pin(fut);
        }

        if self.public_paths.is_public_path(req.path()) {
            let fut = self.service.call(req);
            return Box::pin(fut);
        }

        let token = req
            .headers()
            .get("Authorization")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));

        let Some(token) = token else {
            let error = AppError::AuthError("Missing access token".to_string());
            return Box::pin(async move { Err(error.into()) });
        };

        let identity = self
            .jwt_service
            .verify_access_token(token)
            .and_then(|claims| {
                Ok(Identity {
                    id: claims.subject_id()?,
                    role: claims.role,
                })
            });

        match identity {
            Ok(mut identity) => {
                let service = Rc::clone(&self.service);
                let auth_service = req.app_data::<web::Data<AuthService>>().cloned();
                Box::pin(async move {
                    // staff tokens follow the account: blocking or demotion applies at once
                    if identity.role.is_staff()
                        && let Some(auth_service) = auth_service
                    {
                        identity.role = auth_service.current_staff_role(identity.id).await?;
                    }
                    req.extensions_mut().insert(identity);
                    service.call(req).await
                })
            }
            Err(e) => {
                log::warn!("Rejected token on {}: {e}", req.path());
                let error = AppError::AuthError("Invalid access token".to_string());
                Box::pin(async move { Err(error.into()) })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_paths() {
        let paths = PublicPaths::new();
        assert!(paths.is_public_path("/health"));
        assert!(paths.is_public_path("/api/v1/auth/login"));
        assert!(paths.is_public_path("/api/v1/auth/otp/request"));
        assert!(paths.is_public_path("/swagger-ui/index.html"));
        assert!(!paths.is_public_path("/api/v1/auth/me"));
        assert!(!paths.is_public_path("/api/v1/profiles"));
    }

    #[test]
    fn test_identity_roles() {
        let student = Identity { id: 4, role: Role::Student };
        assert_eq!(student.student_id(), Some(4));
        assert!(matches!(student.require_staff(), Err(AppError::PermissionDenied)));

        let staff = Identity { id: 2, role: Role::Staff };
        assert_eq!(staff.require_staff().unwrap(), 2);
        assert!(staff.require_admin().is_err());
        assert_eq!(staff.student_id(), None);

        let admin = Identity { id: 1, role: Role::Admin };
        assert_eq!(admin.require_admin().unwrap(), 1);
        assert_eq!(admin.require_staff().unwrap(), 1);
    }
}
