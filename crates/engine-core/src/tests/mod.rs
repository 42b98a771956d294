mod tail;
