//! Built-in well-known places, offered as defaults when the input is empty.

use diachi_core::{Candidate, CandidateKind, Components, Coordinates, Source};

struct Place {
  slug:     &'static str,
  name:     &'static str,
  district: Option<&'static str>,
  kind:     CandidateKind,
  at:       (f64, f64),
}

const CITY: &str = "Hồ Chí Minh";

const PLACES: &[Place] = &[
  Place { slug: "quan-1",         name: "Quận 1",         district: None,              kind: CandidateKind::District,        at: (106.7004, 10.7756) },
  Place { slug: "quan-3",         name: "Quận 3",         district: None,              kind: CandidateKind::District,        at: (106.6860, 10.7830) },
  Place { slug: "quan-7",         name: "Quận 7",         district: None,              kind: CandidateKind::District,        at: (106.7218, 10.7340) },
  Place { slug: "binh-thanh",     name: "Bình Thạnh",     district: None,              kind: CandidateKind::District,        at: (106.7093, 10.8106) },
  Place { slug: "phu-nhuan",      name: "Phú Nhuận",      district: None,              kind: CandidateKind::District,        at: (106.6780, 10.7990) },
  Place { slug: "thu-duc",        name: "Thủ Đức",        district: None,              kind: CandidateKind::District,        at: (106.7535, 10.8497) },
  Place { slug: "cho-ben-thanh",  name: "Chợ Bến Thành",  district: Some("Quận 1"),    kind: CandidateKind::PointOfInterest, at: (106.6980, 10.7725) },
  Place { slug: "landmark-81",    name: "Landmark 81",    district: Some("Bình Thạnh"), kind: CandidateKind::PointOfInterest, at: (106.7219, 10.7951) },
];

impl Place {
  fn to_candidate(&self) -> Candidate {
    let district = self.district.unwrap_or(self.name);
    let full_name = match self.district {
      Some(d) => format!("{}, {d}, {CITY}", self.name),
      None => format!("{}, {CITY}", self.name),
    };
    Candidate::new(
      format!("popular:{}", self.slug),
      self.name,
      full_name,
      self.kind,
      Source::Popular,
    )
    .with_coordinates(Coordinates::new(self.at.0, self.at.1))
    .with_components(Components {
      district: Some(district.to_owned()),
      city: Some(CITY.to_owned()),
      country: Some("Việt Nam".to_owned()),
      ..Components::default()
    })
  }
}

/// The fixed popular-places list, in display order.
pub fn popular_places() -> Vec<Candidate> {
  PLACES.iter().map(Place::to_candidate).collect()
}
