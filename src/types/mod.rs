pub mod goodreads;
pub mod google_books;
pub mod pages;
