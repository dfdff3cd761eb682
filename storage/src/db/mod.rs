//! A directory database of wallpaper [`Record`]s, one JSON file per day:
//!
//! ```text
//! <root>/
//!   <yyyy>/
//!     <mm>/
//!       <dd>.json
//!       <dd>-<slug>.json
//! ```
//!
//! The zero-padded directory and file names double as the index, there is no separate index
//! file. Every query scans the directories involved.
//----------------------------------------------------------------------------------------- std lib
use std::{
    fs,
    path::{Path, PathBuf},
};
//--------------------------------------------------------------------------------- other libraries
use chrono::{Datelike, NaiveDate};
use log::{debug, info};
use tracing::instrument;
//----------------------------------------------------------------------------------- local modules
use crate::{
    errors::Error,
    record::Record,
    util::{list_files, list_subdirs, parse_padded, slugify},
};

const EXTENSION: &str = ".json";

/// In what order [`Database::all`] traverses years, months and days.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Order {
    /// Whatever order the filesystem lists the entries in.
    Unsorted,
    /// Chronological.
    #[default]
    Ascending,
    /// Most recent first.
    Descending,
}

impl Order {
    fn arrange<T: Ord>(self, items: impl Iterator<Item = T>) -> Vec<T> {
        let mut items: Vec<T> = items.collect();
        match self {
            Self::Unsorted => {}
            Self::Ascending => items.sort_unstable(),
            Self::Descending => items.sort_unstable_by(|a, b| b.cmp(a)),
        }
        items
    }
}

/// Restricts and orders the dates produced by [`Database::all`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DateFilter {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub order: Order,
}

impl DateFilter {
    #[must_use]
    pub const fn new(year: Option<i32>, month: Option<u32>) -> Self {
        Self {
            year,
            month,
            order: Order::Ascending,
        }
    }

    #[must_use]
    pub const fn order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }

    #[must_use]
    pub const fn reversed(self) -> Self {
        self.order(Order::Descending)
    }
}

/// A date partitioned directory of wallpaper records.
///
/// The root directory does not have to exist, a missing directory is an empty database.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Database {
    root: PathBuf,
}

impl Database {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn year_dir(&self, year: i32) -> PathBuf {
        self.root.join(format!("{year:04}"))
    }

    fn month_dir(&self, year: i32, month: u32) -> PathBuf {
        self.year_dir(year).join(format!("{month:02}"))
    }

    /// Iterates over the years that have a directory in the database.
    pub fn years(&self) -> impl Iterator<Item = i32> + use<> {
        list_subdirs(&self.root)
            .filter_map(|name| parse_padded(&name, 4))
            .filter_map(|year| i32::try_from(year).ok())
    }

    /// Iterates over the months that have a directory in the given year.
    pub fn months(&self, year: i32) -> impl Iterator<Item = u32> + use<> {
        list_subdirs(&self.year_dir(year))
            .filter_map(|name| parse_padded(&name, 2))
            .filter(|month| (1..=12).contains(month))
    }

    /// Iterates over the days that have an entry in the given year and month.
    ///
    /// Files that don't follow the naming scheme, or that would name a day that doesn't exist
    /// in the calendar (like `02/30.json`), are skipped.
    pub fn days(&self, year: i32, month: u32) -> impl Iterator<Item = u32> + use<> {
        list_files(&self.month_dir(year, month))
            .filter_map(|name| day_of_filename(&name))
            .filter(move |&day| NaiveDate::from_ymd_opt(year, month, day).is_some())
    }

    /// Iterates over the days in the database, or the days matching the year and month of the
    /// `filter`.
    ///
    /// With a sorted [`Order`], every level (years, months and days) is sorted before it is
    /// iterated, so [`Order::Ascending`] is chronological and [`Order::Descending`] yields the
    /// most recent date first.
    pub fn all(&self, filter: DateFilter) -> impl Iterator<Item = NaiveDate> + use<> {
        let db = self.clone();
        let DateFilter { year, month, order } = filter;

        let years = year.map_or_else(|| order.arrange(db.years()), |year| vec![year]);
        years.into_iter().flat_map(move |year| {
            let db = db.clone();
            let months = month.map_or_else(|| order.arrange(db.months(year)), |month| vec![month]);
            months.into_iter().flat_map(move |month| {
                order
                    .arrange(db.days(year, month))
                    .into_iter()
                    .filter_map(move |day| NaiveDate::from_ymd_opt(year, month, day))
            })
        })
    }

    /// The most recent date in the database.
    #[must_use]
    pub fn latest(&self) -> Option<NaiveDate> {
        self.all(DateFilter::default().reversed()).next()
    }

    /// The day after the most recent entry, or `today` if the database is empty.
    #[must_use]
    pub fn next_free_date(&self, today: NaiveDate) -> NaiveDate {
        self.latest()
            .and_then(|date| date.succ_opt())
            .unwrap_or(today)
    }

    /// All files in the database that belong to `date`, in lookup order.
    fn entries(&self, date: NaiveDate) -> Vec<PathBuf> {
        let dir = self.month_dir(date.year(), date.month());
        let exact = format!("{:02}{EXTENSION}", date.day());

        let mut names: Vec<String> = list_files(&dir)
            .filter(|name| day_of_filename(name) == Some(date.day()))
            .collect();
        // `DD.json` wins over `DD-<slug>.json`, the rest is lexicographic
        names.sort_unstable_by(|a, b| (*a != exact, a).cmp(&(*b != exact, b)));
        names.into_iter().map(|name| dir.join(name)).collect()
    }

    /// Finds the file that holds the entry for `date`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DateNotFound`] if there is no entry for the date.
    pub fn locate(&self, date: NaiveDate) -> Result<PathBuf, Error> {
        self.entries(date)
            .into_iter()
            .next()
            .ok_or(Error::DateNotFound(date))
    }

    #[must_use]
    pub fn exists(&self, date: NaiveDate) -> bool {
        self.locate(date).is_ok()
    }

    /// Load the record for `date`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DateNotFound`] if there is no entry for the date, and
    /// [`Error::MalformedRecord`] if the entry can't be parsed.
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub fn load(&self, date: NaiveDate) -> Result<Record, Error> {
        let path = self.locate(date)?;
        debug!("loading {date} from {}", path.display());
        Record::load_from_file(&path)
    }

    /// The path [`Database::save`] writes a record with the given name to.
    #[must_use]
    pub fn path_for(&self, date: NaiveDate, name: &str) -> PathBuf {
        let mut filename = format!("{:02}", date.day());
        if !name.is_empty() {
            filename.push('-');
            filename.push_str(&slugify(name));
        }
        filename.push_str(EXTENSION);
        self.month_dir(date.year(), date.month()).join(filename)
    }

    /// Normalize `record` and save it as the entry for `date`, returns the path it was
    /// written to.
    ///
    /// An existing file at exactly that path is overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DateOccupied`] if the date already has an entry under a different file
    /// name (delete it first), or an IO error if the file can't be written.
    #[instrument(skip(self, record), fields(root = %self.root.display(), name = %record.name))]
    pub fn save(&self, date: NaiveDate, record: &Record) -> Result<PathBuf, Error> {
        let path = self.path_for(date, &record.name);

        if let Some(existing) = self.entries(date).into_iter().find(|p| *p != path) {
            return Err(Error::DateOccupied { date, existing });
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        record.normalized().save_to_file(&path)?;
        info!("saved {date} to {}", path.display());

        Ok(path)
    }

    /// Delete the entry for `date`, returns the path of the removed file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DateNotFound`] if there is no entry for the date.
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub fn delete(&self, date: NaiveDate) -> Result<PathBuf, Error> {
        let path = self.locate(date)?;
        fs::remove_file(&path)?;
        info!("deleted {date} ({})", path.display());
        Ok(path)
    }
}

/// Extracts the day from a `DD.json` or `DD-<anything>.json` filename.
fn day_of_filename(name: &str) -> Option<u32> {
    let stem = name.strip_suffix(EXTENSION)?;
    let day = stem.split_once('-').map_or(stem, |(day, _)| day);
    parse_padded(day, 2).filter(|day| (1..=31).contains(day))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{image, record_with, touch};
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[fixture]
    fn tmp() -> TempDir {
        tempfile::tempdir().unwrap()
    }

    /// A database with a few days in January, February and March of 2024 plus one day in 2023.
    #[fixture]
    fn populated(tmp: TempDir) -> (TempDir, Database) {
        for path in [
            "2023/12/31-old-year.json",
            "2024/01/02.json",
            "2024/01/15-middle.json",
            "2024/02/01-first.json",
            "2024/02/29-leap.json",
            "2024/03/05-mountain-view.json",
            "2024/03/10.json",
        ] {
            touch(&tmp.path().join(path));
        }
        let db = Database::new(tmp.path());
        (tmp, db)
    }

    #[rstest]
    #[case("05.json", Some(5))]
    #[case("05-mountain-view.json", Some(5))]
    #[case("31-a-b-c.json", Some(31))]
    #[case("05-extra-garbage.txt", None)]
    #[case("5.json", None)]
    #[case("00.json", None)]
    #[case("32.json", None)]
    #[case("05.json.bak", None)]
    #[case("xx-05.json", None)]
    #[case(".json", None)]
    fn test_day_of_filename(#[case] name: &str, #[case] expected: Option<u32>) {
        assert_eq!(day_of_filename(name), expected);
    }

    #[rstest]
    fn test_missing_root_is_empty(tmp: TempDir) {
        let db = Database::new(tmp.path().join("does-not-exist"));
        assert_eq!(db.years().count(), 0);
        assert_eq!(db.all(DateFilter::default()).count(), 0);
        assert_eq!(db.latest(), None);
        assert!(matches!(
            db.load(date(2024, 1, 1)),
            Err(Error::DateNotFound(_))
        ));
    }

    #[rstest]
    fn test_enumeration_skips_garbage(tmp: TempDir) {
        for path in [
            "2024/01/02.json",
            "2024/13/01.json",
            "2024/1/03.json",
            "2024/02/30.json",
            "2024/02/notes.txt",
            "202/01/01.json",
            "abcd/01/01.json",
            "README.md",
        ] {
            touch(&tmp.path().join(path));
        }
        let db = Database::new(tmp.path());

        let mut years: Vec<_> = db.years().collect();
        years.sort_unstable();
        assert_eq!(years, vec![2024]);
        let mut months: Vec<_> = db.months(2024).collect();
        months.sort_unstable();
        assert_eq!(months, vec![1, 2]);
        assert_eq!(db.days(2024, 2).count(), 0);
        assert_eq!(
            db.all(DateFilter::default()).collect::<Vec<_>>(),
            vec![date(2024, 1, 2)]
        );
    }

    #[rstest]
    fn test_all_chronological(populated: (TempDir, Database)) {
        let (_tmp, db) = populated;
        assert_eq!(
            db.all(DateFilter::default()).collect::<Vec<_>>(),
            vec![
                date(2023, 12, 31),
                date(2024, 1, 2),
                date(2024, 1, 15),
                date(2024, 2, 1),
                date(2024, 2, 29),
                date(2024, 3, 5),
                date(2024, 3, 10),
            ]
        );
    }

    #[rstest]
    fn test_all_reversed_within_year(populated: (TempDir, Database)) {
        let (_tmp, db) = populated;
        assert_eq!(
            db.all(DateFilter::new(Some(2024), None).reversed())
                .collect::<Vec<_>>(),
            vec![
                date(2024, 3, 10),
                date(2024, 3, 5),
                date(2024, 2, 29),
                date(2024, 2, 1),
                date(2024, 1, 15),
                date(2024, 1, 2),
            ]
        );
    }

    #[rstest]
    #[case(DateFilter::new(Some(2024), Some(2)), vec![date(2024, 2, 1), date(2024, 2, 29)])]
    #[case(DateFilter::new(None, Some(12)), vec![date(2023, 12, 31)])]
    #[case(DateFilter::new(Some(2025), None), vec![])]
    #[case(DateFilter::new(Some(2024), Some(4)), vec![])]
    fn test_all_restricted(
        populated: (TempDir, Database),
        #[case] filter: DateFilter,
        #[case] expected: Vec<NaiveDate>,
    ) {
        let (_tmp, db) = populated;
        assert_eq!(db.all(filter).collect::<Vec<_>>(), expected);
    }

    #[rstest]
    fn test_all_unsorted_yields_same_dates(populated: (TempDir, Database)) {
        let (_tmp, db) = populated;
        let mut unsorted: Vec<_> = db
            .all(DateFilter::default().order(Order::Unsorted))
            .collect();
        unsorted.sort_unstable();
        assert_eq!(unsorted, db.all(DateFilter::default()).collect::<Vec<_>>());
    }

    #[rstest]
    fn test_latest_and_next_free_date(populated: (TempDir, Database), tmp: TempDir) {
        let (_populated_tmp, db) = populated;
        assert_eq!(db.latest(), Some(date(2024, 3, 10)));
        assert_eq!(db.next_free_date(date(2030, 1, 1)), date(2024, 3, 11));

        let empty = Database::new(tmp.path());
        assert_eq!(empty.next_free_date(date(2030, 1, 1)), date(2030, 1, 1));
    }

    #[rstest]
    fn test_save_then_load(tmp: TempDir) {
        let db = Database::new(tmp.path());
        let record = record_with(
            "Mountain View",
            vec![image(1920, 1080, "fhd"), image(3840, 2160, "uhd")],
        );

        let path = db.save(date(2024, 3, 5), &record).unwrap();
        assert_eq!(path, tmp.path().join("2024/03/05-mountain-view.json"));
        assert!(path.is_file());

        let loaded = db.load(date(2024, 3, 5)).unwrap();
        assert_eq!(loaded, record.normalized());
        assert_eq!(loaded.resolutions[0].image_url, "uhd");
        let aliases = &loaded.resolution_aliases;
        assert_eq!(aliases[&crate::record::ResolutionAlias::FourK], loaded.resolutions[0]);
        assert_eq!(aliases[&crate::record::ResolutionAlias::FullHd], loaded.resolutions[1]);
    }

    #[rstest]
    fn test_save_overwrites_same_path(tmp: TempDir) {
        let db = Database::new(tmp.path());
        let mut record = record_with("Same", vec![image(1280, 720, "first")]);
        db.save(date(2024, 3, 5), &record).unwrap();

        record.resolutions = vec![image(1280, 720, "second")];
        let path = db.save(date(2024, 3, 5), &record).unwrap();

        assert_eq!(list_files(path.parent().unwrap()).count(), 1);
        assert_eq!(
            db.load(date(2024, 3, 5)).unwrap().resolutions[0].image_url,
            "second"
        );
    }

    #[rstest]
    fn test_save_refuses_second_entry_for_date(tmp: TempDir) {
        let db = Database::new(tmp.path());
        let first = db
            .save(date(2024, 3, 5), &record_with("First", vec![]))
            .unwrap();

        let err = db
            .save(date(2024, 3, 5), &record_with("Second", vec![]))
            .unwrap_err();
        assert!(matches!(err, Error::DateOccupied { existing, .. } if existing == first));

        // deleting first makes room
        assert_eq!(db.delete(date(2024, 3, 5)).unwrap(), first);
        assert!(db.save(date(2024, 3, 5), &record_with("Second", vec![])).is_ok());
    }

    #[rstest]
    fn test_save_without_name(tmp: TempDir) {
        let db = Database::new(tmp.path());
        let path = db.save(date(2024, 1, 9), &record_with("", vec![])).unwrap();
        assert_eq!(path, tmp.path().join("2024/01/09.json"));
    }

    #[rstest]
    fn test_load_ignores_wrong_extension(tmp: TempDir) {
        touch(&tmp.path().join("2024/03/05-extra-garbage.txt"));
        let db = Database::new(tmp.path());

        assert!(matches!(
            db.load(date(2024, 3, 5)),
            Err(Error::DateNotFound(d)) if d == date(2024, 3, 5)
        ));
        assert!(!db.exists(date(2024, 3, 5)));
    }

    #[rstest]
    fn test_load_malformed(tmp: TempDir) {
        let path = tmp.path().join("2024/03/05-broken.json");
        touch(&path);
        std::fs::write(&path, "{\"name\": \"broken\"}").unwrap();
        let db = Database::new(tmp.path());

        assert!(db.exists(date(2024, 3, 5)));
        assert!(matches!(
            db.load(date(2024, 3, 5)),
            Err(Error::MalformedRecord { path: p, .. }) if p == path
        ));
    }

    #[rstest]
    fn test_locate_tie_break(tmp: TempDir) {
        for path in [
            "2024/03/05-zeta.json",
            "2024/03/05-alpha.json",
            "2024/03/05.json",
        ] {
            touch(&tmp.path().join(path));
        }
        let db = Database::new(tmp.path());
        assert_eq!(
            db.locate(date(2024, 3, 5)).unwrap(),
            tmp.path().join("2024/03/05.json")
        );

        std::fs::remove_file(tmp.path().join("2024/03/05.json")).unwrap();
        assert_eq!(
            db.locate(date(2024, 3, 5)).unwrap(),
            tmp.path().join("2024/03/05-alpha.json")
        );
    }

    #[rstest]
    fn test_delete(populated: (TempDir, Database)) {
        let (tmp, db) = populated;
        let removed = db.delete(date(2024, 3, 5)).unwrap();
        assert_eq!(removed, tmp.path().join("2024/03/05-mountain-view.json"));
        assert!(!removed.exists());
        assert!(!db.exists(date(2024, 3, 5)));
        assert!(matches!(
            db.delete(date(2024, 3, 5)),
            Err(Error::DateNotFound(_))
        ));
    }
}
