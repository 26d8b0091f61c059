//! Error Kind
//!
//! The HTTP status classes the resolver answers with.

/// レスポンスのステータス分類
///
/// ブラウザ起動やナビゲーションの失敗はすべて `InternalServerError` に
/// まとめられます。
///
/// ## Examples
/// ```rust
/// use kernel::error::kind::ErrorKind;
///
/// assert_eq!(ErrorKind::TooManyRequests.status_code(), 429);
/// assert_eq!(ErrorKind::TooManyRequests.title(), "Too Many Requests");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// URL やプロキシパラメータが不正
    BadRequest,
    /// API トークン不一致
    Unauthorized,
    /// 未定義のルート
    NotFound,
    /// レート制限超過
    TooManyRequests,
    /// ブラウザ起動・ナビゲーション失敗
    InternalServerError,
}

impl ErrorKind {
    #[inline]
    pub const fn status_code(self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::Unauthorized => 401,
            ErrorKind::NotFound => 404,
            ErrorKind::TooManyRequests => 429,
            ErrorKind::InternalServerError => 500,
        }
    }

    /// HTTP の理由フレーズ。レスポンス本文の `title` に入ります。
    #[inline]
    pub const fn title(self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "Bad Request",
            ErrorKind::Unauthorized => "Unauthorized",
            ErrorKind::NotFound => "Not Found",
            ErrorKind::TooManyRequests => "Too Many Requests",
            ErrorKind::InternalServerError => "Internal Server Error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.title())
    }
}
