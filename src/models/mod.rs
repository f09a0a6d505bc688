use serde::{Deserialize, Serialize};

pub mod title;

pub use title::{ExternalId, ScoredTitle, Title, TitleRecord};

/// Builds the full poster URL from the catalog's image base and a poster path
pub fn poster_url(image_base_url: &str, poster_path: &str) -> String {
    format!(
        "{}/{}",
        image_base_url.trim_end_matches('/'),
        poster_path.trim_start_matches('/')
    )
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// ============================================================================
// Metadata returned by providers
// ============================================================================

/// Short listing entry from search, discover or popular endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieSummary {
    pub id: ExternalId,
    pub title: String,
    pub poster_path: Option<String>,
    pub release_date: Option<String>,
    pub overview: Option<String>,
    pub rating: Option<f32>,
}

/// Full details for a single title
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MovieDetails {
    pub genres: Vec<String>,
    pub release_date: Option<String>,
    pub rating: Option<f32>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CastMember {
    pub name: String,
    pub character: Option<String>,
}

/// A title decorated with whatever metadata could be fetched.
///
/// Every metadata field is optional: a failed lookup leaves it empty
/// instead of failing the response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrichedTitle {
    pub title: String,
    pub external_id: Option<ExternalId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
    pub poster_url: Option<String>,
    pub genres: Vec<String>,
    pub release_date: Option<String>,
    pub rating: Option<f32>,
    pub overview: Option<String>,
    pub cast: Vec<String>,
    pub trailer_url: Option<String>,
}

impl EnrichedTitle {
    /// A result with no metadata attached
    pub fn bare(title: String, external_id: Option<ExternalId>, score: Option<f32>) -> Self {
        Self {
            title,
            external_id,
            score,
            poster_url: None,
            genres: Vec::new(),
            release_date: None,
            rating: None,
            overview: None,
            cast: Vec::new(),
            trailer_url: None,
        }
    }
}

/// Discover listing item returned to clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogItem {
    pub id: ExternalId,
    pub title: String,
    pub poster_url: Option<String>,
    pub release_date: Option<String>,
    pub rating: Option<f32>,
}

impl CatalogItem {
    pub fn from_summary(summary: MovieSummary, image_base_url: &str) -> Self {
        Self {
            poster_url: summary
                .poster_path
                .as_deref()
                .map(|path| poster_url(image_base_url, path)),
            id: summary.id,
            title: summary.title,
            release_date: summary.release_date,
            rating: summary.rating,
        }
    }
}

// ============================================================================
// TMDb API Types
// ============================================================================

/// Paged result wrapper used by search, discover and list endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbPage<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovie {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f32>,
}

impl From<TmdbMovie> for MovieSummary {
    fn from(movie: TmdbMovie) -> Self {
        MovieSummary {
            id: ExternalId::from(movie.id),
            title: movie.title,
            poster_path: non_empty(movie.poster_path),
            release_date: non_empty(movie.release_date),
            overview: non_empty(movie.overview),
            rating: movie.vote_average,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbGenre {
    pub name: String,
}

/// Response from GET /movie/{id}
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovieDetails {
    #[serde(default)]
    pub genres: Vec<TmdbGenre>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f32>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
}

impl From<TmdbMovieDetails> for MovieDetails {
    fn from(details: TmdbMovieDetails) -> Self {
        MovieDetails {
            genres: details.genres.into_iter().map(|g| g.name).collect(),
            release_date: non_empty(details.release_date),
            rating: details.vote_average,
            overview: non_empty(details.overview),
            poster_path: non_empty(details.poster_path),
        }
    }
}

/// Response from GET /movie/{id}/credits
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbCredits {
    #[serde(default)]
    pub cast: Vec<TmdbCastMember>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbCastMember {
    pub name: String,
    #[serde(default)]
    pub character: Option<String>,
}

impl From<TmdbCastMember> for CastMember {
    fn from(member: TmdbCastMember) -> Self {
        CastMember {
            name: member.name,
            character: non_empty(member.character),
        }
    }
}

/// Entry in GET /movie/{id}/videos
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbVideo {
    pub key: String,
    pub site: String,
    #[serde(rename = "type")]
    pub video_type: String,
}

impl TmdbVideo {
    pub fn is_youtube_trailer(&self) -> bool {
        self.site.eq_ignore_ascii_case("youtube") && self.video_type.eq_ignore_ascii_case("trailer")
    }

    pub fn youtube_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poster_url_joins_single_slash() {
        assert_eq!(
            poster_url("https://image.tmdb.org/t/p/w500/", "/abc.jpg"),
            "https://image.tmdb.org/t/p/w500/abc.jpg"
        );
        assert_eq!(
            poster_url("https://image.tmdb.org/t/p/w500", "abc.jpg"),
            "https://image.tmdb.org/t/p/w500/abc.jpg"
        );
    }

    #[test]
    fn test_tmdb_movie_to_summary() {
        let json = r#"{
            "id": 27205,
            "title": "Inception",
            "poster_path": "/oYuLEt3zVCKq57qu2F8dT7NIa6f.jpg",
            "release_date": "2010-07-15",
            "overview": "Cobb, a skilled thief...",
            "vote_average": 8.4,
            "genre_ids": [28, 878]
        }"#;

        let movie: TmdbMovie = serde_json::from_str(json).unwrap();
        let summary = MovieSummary::from(movie);
        assert_eq!(summary.id, ExternalId::new("27205"));
        assert_eq!(summary.title, "Inception");
        assert_eq!(summary.release_date.as_deref(), Some("2010-07-15"));
        assert_eq!(summary.rating, Some(8.4));
    }

    #[test]
    fn test_empty_release_date_is_absent() {
        let json = r#"{"id": 1, "title": "Untitled", "release_date": "", "poster_path": null}"#;
        let summary = MovieSummary::from(serde_json::from_str::<TmdbMovie>(json).unwrap());
        assert_eq!(summary.release_date, None);
        assert_eq!(summary.poster_path, None);
    }

    #[test]
    fn test_tmdb_details_to_details() {
        let json = r#"{
            "genres": [{"id": 28, "name": "Action"}, {"id": 878, "name": "Science Fiction"}],
            "release_date": "2010-07-15",
            "vote_average": 8.369,
            "overview": "Cobb, a skilled thief...",
            "poster_path": "/inception.jpg",
            "runtime": 148
        }"#;

        let details = MovieDetails::from(serde_json::from_str::<TmdbMovieDetails>(json).unwrap());
        assert_eq!(details.genres, vec!["Action", "Science Fiction"]);
        assert_eq!(details.poster_path.as_deref(), Some("/inception.jpg"));
        assert_eq!(details.rating, Some(8.369));
    }

    #[test]
    fn test_video_trailer_filter() {
        let trailer: TmdbVideo =
            serde_json::from_str(r#"{"key": "YoHD9XEInc0", "site": "YouTube", "type": "Trailer"}"#)
                .unwrap();
        let teaser: TmdbVideo =
            serde_json::from_str(r#"{"key": "abc", "site": "YouTube", "type": "Teaser"}"#).unwrap();
        let vimeo: TmdbVideo =
            serde_json::from_str(r#"{"key": "123", "site": "Vimeo", "type": "Trailer"}"#).unwrap();

        assert!(trailer.is_youtube_trailer());
        assert!(!teaser.is_youtube_trailer());
        assert!(!vimeo.is_youtube_trailer());
        assert_eq!(
            trailer.youtube_url(),
            "https://www.youtube.com/watch?v=YoHD9XEInc0"
        );
    }

    #[test]
    fn test_catalog_item_from_summary() {
        let summary = MovieSummary {
            id: ExternalId::from(603),
            title: "The Matrix".to_string(),
            poster_path: Some("/matrix.jpg".to_string()),
            release_date: Some("1999-03-30".to_string()),
            overview: None,
            rating: Some(8.2),
        };

        let item = CatalogItem::from_summary(summary, "https://img.test/w200");
        assert_eq!(item.poster_url.as_deref(), Some("https://img.test/w200/matrix.jpg"));
        assert_eq!(item.title, "The Matrix");
    }

    #[test]
    fn test_bare_enriched_title_has_no_metadata() {
        let bare = EnrichedTitle::bare("Heat".to_string(), None, Some(0.42));
        assert_eq!(bare.score, Some(0.42));
        assert!(bare.poster_url.is_none());
        assert!(bare.cast.is_empty());
        assert!(bare.trailer_url.is_none());
    }
}
